use anyhow::{bail, Result};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;
use std::process;

use elf_shrink::{backup_once, backup_path, run_passes, validate_target, Toolset};

/// Performs multiple optimization passes over an ELF binary.
#[derive(Debug, Parser)]
#[command(version, about, after_help = "Example: elf-shrink ./a.out -2")]
struct Cli {
    /// ELF executable to shrink in place.
    target: PathBuf,

    /// Pass count written as -<times> (e.g. -2). Defaults to 1 if omitted.
    #[arg(value_parser = parse_pass_count, allow_hyphen_values = true)]
    passes: Option<u32>,
}

/// Parse the legacy `-<times>` pass-count argument.
///
/// Counts below 1 clamp to 1 rather than erroring; a missing leading dash
/// or non-numeric count is a usage error.
fn parse_pass_count(raw: &str) -> Result<u32, String> {
    let Some(count) = raw.strip_prefix('-') else {
        return Err(format!("must be -<times> (e.g. -2), got `{}`", raw));
    };
    let count: i64 = count
        .parse()
        .map_err(|_| format!("invalid optimization count: {}", raw))?;
    Ok(count.clamp(1, i64::from(u32::MAX)) as u32)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        process::exit(if err.use_stderr() { 1 } else { 0 });
    });

    if let Err(error) = run(&cli) {
        eprintln!("{error:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    validate_target(&cli.target)?;

    let tools = Toolset::discover();
    if tools.is_empty() {
        bail!(
            "No optimization tools found in PATH \
             (llvm-strip/strip, llvm-objcopy/objcopy, patchelf, sstrip, upx)"
        );
    }

    // The pristine copy must exist before any tool touches the target.
    if backup_once(&cli.target)? {
        debug!("Backup written: {}", backup_path(&cli.target).display());
    }

    run_passes(&cli.target, &tools, cli.passes.unwrap_or(1));
    info!("Done.");
    Ok(())
}
