//! ELF executable shrinking by orchestrating external tools.
//!
//! Delegates all byte-level work to `strip`, `objcopy`, `patchelf`,
//! `sstrip` and `upx` instead of rewriting ELF structures directly.
//! This crate only locates the tools on `PATH`, invokes them in a fixed
//! order against one target file, and measures whether each step actually
//! made the file smaller. A pass that shrinks nothing stops the loop.

mod backup;
mod check;
mod passes;
mod tools;

pub use backup::{backup_once, backup_path};
pub use check::{has_elf_magic, validate_target};
pub use passes::{run_pass, run_passes, Step, STEPS};
pub use tools::{find_tool, path_dirs, ToolRole, Toolset};
