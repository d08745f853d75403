//! # tarx Entry Naming (`common::archive::names`)
//!
//! File: cli/src/common/archive/names.rs
//!
//! ## Overview
//!
//! Mapping between filesystem paths and archive entry names, in both
//! directions:
//!
//! - **Writing**: an object found while walking a root is named by the
//!   root's own final component followed by the object's path relative to
//!   the root. `tarx -f out.tar ../work/project` and `tarx -f out.tar
//!   /abs/work/project` both produce `project/...` entries; the working
//!   directory and the root's parent never leak into names.
//! - **Reading**: an entry name is joined onto the extraction directory only
//!   if it stays inside it. Parent-directory segments, absolute names and
//!   drive prefixes are rejected with `TarxError::TraversalGuard`.
//!
//! Names are kept as `Path`s; the `tar` crate stores them with `/`
//! separators.
//!
use crate::core::error::{Result, TarxError};
use anyhow::{anyhow, Context};
use std::path::{Component, Path, PathBuf};

/// Prefix shared by every entry of a root: its final path component.
///
/// Roots without one (`.`, `..`, `/`) have no prefix, so their contents are
/// named relative to the root itself.
pub fn root_prefix(root: &Path) -> Option<PathBuf> {
    root.file_name().map(PathBuf::from)
}

/// Computes the entry name of `path`, an object found while walking `root`.
///
/// Returns `None` for the root itself when the root has no prefix; there is
/// nothing to name it by.
pub fn entry_name(root: &Path, prefix: Option<&Path>, path: &Path) -> Result<Option<PathBuf>> {
    let relative = path.strip_prefix(root).map_err(|_| {
        anyhow!(TarxError::PathResolution {
            path: path.to_path_buf(),
            reason: format!("not inside archive root {:?}", root),
        })
    })?;

    let name = match prefix {
        Some(prefix) if relative.as_os_str().is_empty() => prefix.to_path_buf(),
        Some(prefix) => prefix.join(relative),
        None if relative.as_os_str().is_empty() => return Ok(None),
        None => relative.to_path_buf(),
    };
    Ok(Some(name))
}

/// Resolves an entry name against the extraction directory.
///
/// `.` segments are dropped. Returns `None` when nothing is left (the entry
/// names the extraction directory itself).
///
/// # Errors
///
/// `TarxError::TraversalGuard` if the name contains `..`, is absolute, or
/// carries a drive/UNC prefix.
pub fn resolve_entry_path(destination: &Path, name: &Path) -> Result<Option<PathBuf>> {
    let mut relative = PathBuf::new();
    for component in name.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(anyhow!(TarxError::TraversalGuard {
                    name: name.to_string_lossy().into_owned(),
                }));
            }
        }
    }

    if relative.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(destination.join(relative)))
    }
}

/// Checks that `path` stays inside `canonical_destination` once symlinks
/// are resolved.
///
/// `path` need not exist yet: its deepest existing ancestor is checked, which
/// is where `create_dir_all` would start creating.
pub fn ensure_contained(canonical_destination: &Path, path: &Path, name: &Path) -> Result<()> {
    let existing = path
        .ancestors()
        .find(|ancestor| ancestor.symlink_metadata().is_ok())
        .unwrap_or(path);
    let canonical = existing
        .canonicalize()
        .with_context(|| format!("Failed to resolve directory {:?}", existing))?;
    if canonical.starts_with(canonical_destination) {
        Ok(())
    } else {
        Err(anyhow!(TarxError::TraversalGuard {
            name: name.to_string_lossy().into_owned(),
        }))
    }
}
