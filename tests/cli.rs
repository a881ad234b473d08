//! Integration tests driving the compiled binary with fake tools on PATH.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_elf-shrink");

fn set_mode(path: &Path, mode: u32) {
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(mode);
    fs::set_permissions(path, perms).unwrap();
}

fn write_fake_elf(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    let mut bytes = vec![0x7f, b'E', b'L', b'F'];
    bytes.resize(len, 0u8);
    fs::write(&path, &bytes).unwrap();
    set_mode(&path, 0o755);
    path
}

/// Write a fake tool script into the tools directory.
///
/// The orchestrator is run with PATH set to the tools directory alone, so
/// the script restores a usable PATH for its own commands before picking
/// up the target from its last argument.
fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\nPATH=/usr/bin:/bin\nexport PATH\nfor a in \"$@\"; do t=\"$a\"; done\n{}\n",
        body
    );
    fs::write(&path, script).unwrap();
    set_mode(&path, 0o755);
    path
}

/// Truncates the target to 8 bytes, but only when that shrinks it.
const SHRINK_TO_8: &str = r#"if [ "$(wc -c < "$t")" -gt 8 ]; then
    head -c 8 "$t" > "$t.tmp" && mv "$t.tmp" "$t"
fi"#;

fn run_bin(args: &[&str], tools_dir: &Path) -> Output {
    Command::new(BIN)
        .args(args)
        .env("PATH", tools_dir)
        .env("RUST_LOG", "info")
        .output()
        .unwrap()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_missing_target_exits_1() {
    let tools = TempDir::new().unwrap();
    let output = run_bin(&["/nonexistent/path/to/binary"], tools.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr_of(&output).contains("Target not found"),
        "unexpected stderr: {}",
        stderr_of(&output)
    );
}

#[test]
fn test_non_elf_target_exits_1_without_backup() {
    let work = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    let target = work.path().join("script");
    fs::write(&target, "#!/bin/sh\necho hi\n").unwrap();
    set_mode(&target, 0o755);

    let output = run_bin(&[target.to_str().unwrap()], tools.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr_of(&output).contains("not an ELF binary"),
        "unexpected stderr: {}",
        stderr_of(&output)
    );
    assert!(!work.path().join("script.bak").exists());
}

#[test]
fn test_pass_count_without_dash_is_usage_error() {
    let work = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    let target = write_fake_elf(work.path(), "prog", 64);

    let output = run_bin(&[target.to_str().unwrap(), "3"], tools.path());
    assert_eq!(output.status.code(), Some(1));
    // Usage error: no backup, no mutation.
    assert!(!work.path().join("prog.bak").exists());
    assert_eq!(fs::metadata(&target).unwrap().len(), 64);
}

#[test]
fn test_no_tools_exits_1_and_leaves_target_untouched() {
    let work = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    let target = write_fake_elf(work.path(), "prog", 64);
    let before = fs::read(&target).unwrap();

    let output = run_bin(&[target.to_str().unwrap()], tools.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr_of(&output).contains("No optimization tools found"),
        "unexpected stderr: {}",
        stderr_of(&output)
    );
    assert_eq!(fs::read(&target).unwrap(), before);
    assert!(!work.path().join("prog.bak").exists());
}

#[test]
fn test_shrinks_and_keeps_pristine_backup() {
    let work = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    let target = write_fake_elf(work.path(), "prog", 64);
    let pristine = fs::read(&target).unwrap();
    write_tool(tools.path(), "strip", SHRINK_TO_8);

    let output = run_bin(&[target.to_str().unwrap()], tools.path());
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr_of(&output));
    assert_eq!(fs::metadata(&target).unwrap().len(), 8);

    let backup = work.path().join("prog.bak");
    assert_eq!(fs::read(&backup).unwrap(), pristine);

    // A second run must not refresh the backup with the shrunk bytes.
    let output = run_bin(&[target.to_str().unwrap()], tools.path());
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read(&backup).unwrap(), pristine);
    assert!(stderr_of(&output).contains("Done."));
}

#[test]
fn test_multi_pass_stops_early() {
    let work = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    let target = write_fake_elf(work.path(), "prog", 64);
    write_tool(tools.path(), "strip", SHRINK_TO_8);

    let output = run_bin(&[target.to_str().unwrap(), "-3"], tools.path());
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr_of(&output));

    // Pass 1 shrinks, pass 2 finds nothing, pass 3 never runs.
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Pass 1/3"), "stderr: {}", stderr);
    assert!(stderr.contains("Pass 2/3"), "stderr: {}", stderr);
    assert!(!stderr.contains("Pass 3/3"), "stderr: {}", stderr);
    assert!(
        stderr.contains("No further changes; stopping early."),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_help_exits_0() {
    let tools = TempDir::new().unwrap();
    let output = run_bin(&["--help"], tools.path());
    assert_eq!(output.status.code(), Some(0));
}
