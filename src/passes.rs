//! The fixed step sequence and the multi-pass shrink loop.

use log::{debug, info};
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::tools::{ToolRole, Toolset};

/// One external invocation: a tool role plus its fixed arguments.
///
/// The target path is appended as the final argument, so descriptors
/// stay data-only and one runner handles the size bookkeeping for all
/// of them.
#[derive(Debug)]
pub struct Step {
    pub role: ToolRole,
    pub args: &'static [&'static str],
}

/// The step sequence for one pass, in execution order.
pub const STEPS: &[Step] = &[
    // Symbol stripping, unneeded first, then all.
    Step {
        role: ToolRole::Strip,
        args: &["--strip-unneeded"],
    },
    Step {
        role: ToolRole::Strip,
        args: &["--strip-all"],
    },
    // Debug info, then non-essential metadata sections, then compress
    // whatever debug sections remain.
    Step {
        role: ToolRole::Objcopy,
        args: &["--strip-debug"],
    },
    Step {
        role: ToolRole::Objcopy,
        args: &[
            "--remove-section=.comment",
            "--remove-section=.note",
            "--remove-section=.note.*",
            "--remove-section=.gnu_debuglink",
        ],
    },
    Step {
        role: ToolRole::Objcopy,
        args: &["--compress-debug-sections"],
    },
    // Shrink RPATH if present.
    Step {
        role: ToolRole::Patchelf,
        args: &["--shrink-rpath"],
    },
    // Super-strip: drops section headers entirely.
    Step {
        role: ToolRole::Sstrip,
        args: &[],
    },
    // Pack last.
    Step {
        role: ToolRole::Upx,
        args: &["--best", "--lzma"],
    },
];

/// Current size of the target, or 0 when metadata is unreadable.
fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Run one external command with its output suppressed, so tool chatter
/// never interleaves with the progress log.
fn run_quiet(program: &Path, args: &[&str], target: &Path) -> io::Result<ExitStatus> {
    Command::new(program)
        .args(args)
        .arg(target)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
}

/// Command line as it would be typed, quoting arguments with spaces.
fn render_command(program: &Path, args: &[&str], target: &Path) -> String {
    let mut parts = vec![program.display().to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.push(target.display().to_string());
    parts
        .into_iter()
        .map(|p| {
            if p.contains(' ') {
                format!("\"{}\"", p)
            } else {
                p
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run one step and report whether it shrank the target.
///
/// Productive means the tool exited 0 AND the file got strictly smaller.
/// A spawn failure or non-zero exit is merely non-productive.
fn run_step(program: &Path, args: &[&str], target: &Path) -> bool {
    let before = file_size(target);
    debug!("[exec] {}", render_command(program, args, target));
    let status = run_quiet(program, args, target);
    let after = file_size(target);
    debug!("{} -> {} bytes", before, after);
    match status {
        Ok(status) => status.success() && after < before,
        Err(e) => {
            debug!("failed to run {}: {}", program.display(), e);
            false
        }
    }
}

/// Run the full step sequence once against the target.
///
/// Steps whose role has no resolved tool are skipped silently. Step
/// failures never abort the pass; the remaining steps still run.
///
/// Returns whether any step was productive.
pub fn run_pass(target: &Path, tools: &Toolset) -> bool {
    let mut productive = false;
    for step in STEPS {
        let Some(program) = tools.resolve(step.role) else {
            continue;
        };
        if run_step(program, step.args, target) {
            productive = true;
        }
    }
    info!("Size: {} bytes", file_size(target));
    productive
}

/// Run up to `requested` passes, stopping after the first pass that
/// shrinks nothing. Requests below 1 are clamped to a single pass.
///
/// The tools are treated as deterministic and non-growing, so a pass
/// with no shrink means further identical passes would be pointless.
///
/// Returns the number of passes that actually ran.
pub fn run_passes(target: &Path, tools: &Toolset, requested: u32) -> u32 {
    let total = requested.max(1);
    let mut completed = 0;
    for pass in 1..=total {
        info!("Pass {}/{}", pass, total);
        completed = pass;
        if !run_pass(target, tools) {
            info!("No further changes; stopping early.");
            break;
        }
    }
    completed
}
