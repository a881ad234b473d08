//! External tool discovery on the search path.

use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// The external tool roles a shrink pass can call on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRole {
    /// Symbol stripper (`llvm-strip` or `strip`).
    Strip,
    /// Section editor (`llvm-objcopy` or `objcopy`).
    Objcopy,
    /// RPATH shrinker (`patchelf`).
    Patchelf,
    /// Aggressive section-header stripper (`sstrip`).
    Sstrip,
    /// Executable packer (`upx`).
    Upx,
}

/// Resolved tool paths, one optional entry per role.
///
/// Built once at startup and passed by reference afterwards. A missing
/// tool is not an error; steps needing it are skipped.
#[derive(Debug, Default)]
pub struct Toolset {
    pub strip: Option<PathBuf>,
    pub objcopy: Option<PathBuf>,
    pub patchelf: Option<PathBuf>,
    pub sstrip: Option<PathBuf>,
    pub upx: Option<PathBuf>,
}

impl Toolset {
    /// Discover tools in the directories listed in `PATH`.
    #[must_use = "discovered tools should be used"]
    pub fn discover() -> Self {
        Self::discover_in(&path_dirs())
    }

    /// Discover tools in an explicit directory list.
    ///
    /// LLVM-flavored names are preferred over the GNU fallbacks: a
    /// preferred name anywhere in `dirs` wins over a fallback everywhere.
    #[must_use = "discovered tools should be used"]
    pub fn discover_in(dirs: &[PathBuf]) -> Self {
        Toolset {
            strip: find_tool(dirs, &["llvm-strip", "strip"]),
            objcopy: find_tool(dirs, &["llvm-objcopy", "objcopy"]),
            patchelf: find_tool(dirs, &["patchelf"]),
            sstrip: find_tool(dirs, &["sstrip"]),
            upx: find_tool(dirs, &["upx"]),
        }
    }

    /// Path resolved for a role, if any.
    #[must_use]
    pub fn resolve(&self, role: ToolRole) -> Option<&Path> {
        match role {
            ToolRole::Strip => self.strip.as_deref(),
            ToolRole::Objcopy => self.objcopy.as_deref(),
            ToolRole::Patchelf => self.patchelf.as_deref(),
            ToolRole::Sstrip => self.sstrip.as_deref(),
            ToolRole::Upx => self.upx.as_deref(),
        }
    }

    /// True when no role resolved at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strip.is_none()
            && self.objcopy.is_none()
            && self.patchelf.is_none()
            && self.sstrip.is_none()
            && self.upx.is_none()
    }
}

/// Directories listed in the process's `PATH`, in order.
#[must_use]
pub fn path_dirs() -> Vec<PathBuf> {
    env::var_os("PATH")
        .map(|path| env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Find the first executable matching one of `names` in `dirs`.
///
/// Names are tried in order; for each name every directory is probed in
/// order. Only regular files with an execute bit count.
///
/// Returns `None` if no directory yields a match for any name.
#[must_use = "found tool path should be used"]
pub fn find_tool(dirs: &[PathBuf], names: &[&str]) -> Option<PathBuf> {
    for name in names {
        for dir in dirs {
            let candidate = dir.join(name);
            if is_executable_file(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

fn is_executable_file(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(metadata) => {
            metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
        }
        Err(_) => false,
    }
}
