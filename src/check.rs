//! Target precondition checks.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// First four bytes of every ELF file.
const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Check whether a file starts with the ELF magic bytes.
///
/// A file shorter than four bytes is not ELF, not an error.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn has_elf_magic(path: &Path) -> Result<bool> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == ELF_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to read {}", path.display()))
        }
    }
}

/// Validate that a path is fit to be shrunk: it exists, is a regular file,
/// carries an execute bit, and starts with the ELF magic.
///
/// Checks run in that order so the diagnostic names the first thing that is
/// actually wrong.
///
/// # Errors
///
/// Returns an error describing the first failed check. Nothing is modified.
pub fn validate_target(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Target not found: {}", path.display());
    }

    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
    if !metadata.is_file() {
        bail!("Target is not a regular file: {}", path.display());
    }
    if metadata.permissions().mode() & 0o111 == 0 {
        bail!(
            "Target lacks execute permission: {}",
            path.display()
        );
    }

    if !has_elf_magic(path)? {
        bail!("Target is not an ELF binary: {}", path.display());
    }

    Ok(())
}
