//! # tarx Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! This module centralizes the filesystem mutations made while extracting an
//! archive or cleaning up after a failed one. It wraps `std::fs` calls and
//! adds context (operation and path) to every error.
//!
//! ## Architecture
//!
//! - **`ensure_dir_exists`**: creates a directory and its ancestors (`mkdir -p`), and
//!   fails if the path exists but is not a directory.
//! - **`remove_existing_file`**: clears a non-directory object (file or symlink)
//!   from a path about to be recreated, so a read-only or symlinked leftover
//!   cannot block or redirect the write.
//! - **`set_mode`**: applies tar permission bits to a path.
//! - **`grant_owner_access`**: makes an existing directory writable and
//!   searchable by its owner again before it is populated.
//! - **`set_mtime`**: best-effort modification-time restore.
//! - **`remove_partial_file`**: deletes an incomplete archive after a failed write.
//!
//! ```rust
//! use crate::common::fs::io;
//!
//! io::ensure_dir_exists(Path::new("dest/root/sub"))?;
//! io::set_mode(Path::new("dest/root/sub"), 0o755)?;
//! ```
//!
use crate::core::error::Result;
use anyhow::Context;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Ensures that a directory exists at the specified path.
///
/// If the path does not exist, the directory is created along with any
/// missing parents. If the path already exists as a directory, nothing
/// happens.
///
/// # Errors
///
/// Returns an `Err` if:
/// - The path exists but is not a directory.
/// - Creating the directory fails (e.g., due to permissions).
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.is_dir() {
        debug!("Directory already exists: {:?}", path);
        return Ok(());
    }
    if path.exists() {
        anyhow::bail!("Path exists but is not a directory: {:?}", path);
    }
    fs::create_dir_all(path).with_context(|| format!("Failed to create directory {:?}", path))?;
    debug!("Created directory: {:?}", path);
    Ok(())
}

/// Removes whatever non-directory object sits at `path`, if any.
pub fn remove_existing_file(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => fs::remove_file(path)
            .with_context(|| format!("Failed to replace existing file {:?}", path)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to inspect {:?}", path)),
    }
}

/// Applies the permission bits stored in a tar header to `path`.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .with_context(|| format!("Failed to set permissions {:o} on {:?}", mode, path))
}

/// Applies the permission bits stored in a tar header to `path`.
///
/// Only the owner-write bit has a counterpart here: it maps to the
/// read-only attribute.
#[cfg(not(unix))]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    let mut permissions = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata of {:?}", path))?
        .permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to set permissions on {:?}", path))
}

/// Adds owner read, write and search permission to an existing directory.
///
/// Directories already carrying those bits are left untouched.
#[cfg(unix)]
pub fn grant_owner_access(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata of {:?}", path))?
        .permissions()
        .mode();
    if mode & 0o700 == 0o700 {
        return Ok(());
    }
    debug!("Granting owner access to {:?} (mode {:o})", path, mode & 0o7777);
    fs::set_permissions(path, fs::Permissions::from_mode((mode | 0o700) & 0o7777))
        .with_context(|| format!("Failed to make {:?} writable", path))
}

/// Clears the read-only attribute of an existing directory.
#[cfg(not(unix))]
pub fn grant_owner_access(path: &Path) -> Result<()> {
    let mut permissions = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata of {:?}", path))?
        .permissions();
    if !permissions.readonly() {
        return Ok(());
    }
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to make {:?} writable", path))
}

/// Restores a modification time given in seconds since the Unix epoch.
///
/// Failures are logged and ignored.
pub fn set_mtime(file: &File, path: &Path, mtime_secs: u64) {
    let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs);
    if let Err(e) = file.set_modified(modified) {
        debug!("Could not restore modification time of {:?}: {}", path, e);
    }
}

/// Deletes the incomplete archive left behind by a failed write.
///
/// Removal failures are logged; the caller already has an error to report.
pub fn remove_partial_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed incomplete archive {:?}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove incomplete archive {:?}: {}", path, e),
    }
}
