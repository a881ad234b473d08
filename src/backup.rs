//! One-time backup of the target before mutation.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Sibling backup path for a target: `.bak` appended to the file name.
///
/// Appends rather than replacing any existing extension, so `a.out`
/// backs up to `a.out.bak`.
#[must_use]
pub fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Copy the target to its `.bak` sibling unless one already exists.
///
/// Idempotent: an existing backup is left untouched so the pristine copy
/// from the first-ever run survives repeated invocations.
///
/// Returns `Ok(true)` if the backup was created, `Ok(false)` if it
/// already existed.
///
/// # Errors
///
/// Returns an error if the copy fails (permissions, disk space). Callers
/// must not mutate the target after such a failure.
pub fn backup_once(target: &Path) -> Result<bool> {
    let backup = backup_path(target);
    if backup.exists() {
        return Ok(false);
    }
    fs::copy(target, &backup)
        .with_context(|| format!("Failed to create backup: {}", backup.display()))?;
    Ok(true)
}
