//! # tarx Archive Reader (`common::archive::reader`)
//!
//! File: cli/src/common/archive/reader.rs
//!
//! ## Overview
//!
//! Unpacks a tar archive (gzip-compressed if its name ends in `.gz` or
//! `.gzip`) into a target directory.
//!
//! ## Architecture
//!
//! Entries are read sequentially until the end-of-archive marker:
//!
//! - **Directories** are created with any missing ancestors. Existing
//!   directories are fine, so extracting twice into one target works. Their
//!   permission bits and mtimes are applied once every entry has been
//!   written, deepest directory first, so a read-only directory can still
//!   receive its children.
//! - **Regular files** replace whatever non-directory object is at the
//!   target path, receive exactly the declared number of bytes, then get
//!   their permission bits and mtime.
//! - **Other entry types** (symlinks, links, devices) are skipped.
//!
//! Every entry name passes through `names::resolve_entry_path` and
//! `names::ensure_contained` before anything is created, so no entry can
//! write outside the target, neither through `..` segments nor through a
//! symlink already present in the target.
//!
//! ## Usage
//!
//! ```rust
//! let stats = reader::read_archive(Path::new("out.tar.gz"), Path::new("dest"), &settings)?;
//! println!("{} files, {} directories", stats.files, stats.directories);
//! ```
//!
use crate::common::archive::compression::{ArchiveSource, Compression, SourceReadError};
use crate::common::archive::{names, EntryError};
use crate::common::fs::io; // Directory creation, mode and mtime restore
use crate::core::config::ArchiveSettings;
use crate::core::error::{Result, TarxError};
use anyhow::{anyhow, Context};
use std::fs::{File, OpenOptions};
use std::io::{self as stdio, ErrorKind};
use std::path::{Path, PathBuf};
use tar::{Archive, Entry, EntryType}; // Tar parsing
use tracing::{debug, info, warn};

/// Totals for one `read_archive` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub directories: usize,
    /// File body bytes written.
    pub bytes: u64,
    /// Entries skipped because of errors (only under `ErrorPolicy::Continue`).
    pub skipped: usize,
}

/// Directory metadata applied after all entries are extracted.
#[derive(Debug)]
struct PendingDir {
    path: PathBuf,
    mode: u32,
    mtime: u64,
}

/// # Read Archive (`read_archive`)
///
/// Extracts every entry of `archive` under `destination`, creating
/// `destination` if needed.
///
/// ## Errors
///
/// Returns an `Err` if:
/// - A path cannot be resolved, or the archive cannot be opened.
/// - The stream is not a valid (gzip-wrapped) tar archive (`TarxError::Format`).
/// - An entry name escapes the destination (`TarxError::TraversalGuard`).
/// - A directory or file cannot be created or written (fail-fast policy).
pub fn read_archive(
    archive: &Path,
    destination: &Path,
    settings: &ArchiveSettings,
) -> Result<ExtractStats> {
    let archive_path = absolute_path(archive)?;
    let destination = absolute_path(destination)?;
    let compression = Compression::from_path(&archive_path);
    debug!(
        "Reading archive {:?} with compression {:?} into {:?}",
        archive_path, compression, destination
    );

    // Open the archive first so a missing archive leaves no empty target behind.
    let file = File::open(&archive_path)
        .with_context(|| format!("Failed to open archive file {:?}", archive_path))?;
    io::ensure_dir_exists(&destination)?;
    // Containment checks compare against the target with symlinks resolved.
    let canonical_destination = destination
        .canonicalize()
        .with_context(|| format!("Failed to resolve extraction directory {:?}", destination))?;

    // Plain or gzip source below, tar parser on top.
    let mut archive = Archive::new(compression.wrap_reader(file));
    let mut stats = ExtractStats::default();
    let mut pending_dirs = Vec::new();

    let entries = archive
        .entries()
        .map_err(stream_error)
        .context("Failed to read archive")?;
    for entry in entries {
        let mut entry = entry
            .map_err(stream_error)
            .context("Failed to read next archive entry")?;
        let outcome = extract_entry(
            &mut entry,
            &destination,
            &canonical_destination,
            &mut pending_dirs,
            &mut stats,
        );
        if let Err(e) = outcome {
            e.handle(settings.on_error, &mut stats.skipped)?;
        }
    }

    // Directory modes last, so read-only directories could still be filled.
    apply_directory_metadata(pending_dirs, settings, &mut stats)?;
    Ok(stats)
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        anyhow!(TarxError::PathResolution {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    })
}

/// Classifies a failure reading the archive stream.
///
/// Failures of the archive file itself stay I/O errors whatever their kind.
/// Otherwise the `tar` and `flate2` crates report malformed input as
/// `InvalidData`, `InvalidInput`, `UnexpectedEof` or `Other`; those become
/// `TarxError::Format`.
fn stream_error(e: stdio::Error) -> anyhow::Error {
    if is_source_failure(&e) {
        return anyhow!(e);
    }
    match e.kind() {
        ErrorKind::InvalidData
        | ErrorKind::InvalidInput
        | ErrorKind::UnexpectedEof
        | ErrorKind::Other => anyhow!(TarxError::Format(e.to_string())),
        _ => anyhow!(e),
    }
}

/// Whether a `SourceReadError` sits anywhere in the error's chain.
///
/// `tar` wraps the errors of its reader in its own error type, and the
/// payload of an `io::Error` is not part of its `source()` chain, so both
/// links are followed by hand.
fn is_source_failure(e: &stdio::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> =
        e.get_ref().map(|inner| inner as &(dyn std::error::Error + 'static));
    while let Some(err) = current {
        if err.is::<SourceReadError>() {
            return true;
        }
        current = match err.downcast_ref::<stdio::Error>().and_then(stdio::Error::get_ref) {
            Some(payload) => Some(payload as &(dyn std::error::Error + 'static)),
            None => err.source(),
        };
    }
    false
}

/// Recreates one entry on disk.
fn extract_entry(
    entry: &mut Entry<'_, ArchiveSource>,
    destination: &Path,
    canonical_destination: &Path,
    pending_dirs: &mut Vec<PendingDir>,
    stats: &mut ExtractStats,
) -> std::result::Result<(), EntryError> {
    let name = entry
        .path()
        .map_err(|e| EntryError::Fatal(stream_error(e)))?
        .into_owned();
    let header = entry.header();
    let entry_type = header.entry_type();
    let mode = header
        .mode()
        .map_err(|e| EntryError::Fatal(stream_error(e).context(format!("Bad mode for {:?}", name))))?;
    let mtime = header
        .mtime()
        .map_err(|e| EntryError::Fatal(stream_error(e).context(format!("Bad mtime for {:?}", name))))?;

    if !entry_type.is_dir() && !entry_type.is_file() {
        skip_special_entry(&name, entry_type);
        return Ok(());
    }

    let Some(target) =
        names::resolve_entry_path(destination, &name).map_err(EntryError::Skippable)?
    else {
        debug!("Entry {:?} names the extraction directory itself", name);
        return Ok(());
    };

    if entry_type.is_dir() {
        // A directory left read-only by an earlier extraction must accept
        // children again; its archived mode is restored at the end.
        names::ensure_contained(canonical_destination, &target, &name)
            .and_then(|()| io::ensure_dir_exists(&target))
            .and_then(|()| io::grant_owner_access(&target))
            .map_err(EntryError::Skippable)?;
        pending_dirs.push(PendingDir {
            path: target,
            mode,
            mtime,
        });
        stats.directories += 1;
        info!("x {}", name.display());
        return Ok(());
    }

    // Regular file: check and create the parent, then replace whatever is there.
    let parent = target.parent().unwrap_or(destination);
    let mut file = names::ensure_contained(canonical_destination, parent, &name)
        .and_then(|()| io::ensure_dir_exists(parent))
        .and_then(|()| io::remove_existing_file(&target))
        .and_then(|()| {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&target)
                .with_context(|| format!("Failed to create file {:?}", target))
        })
        .map_err(EntryError::Skippable)?;

    // Copy the body; a short body means the archive was cut off.
    let size = entry.size();
    let copied = stdio::copy(entry, &mut file)
        .with_context(|| format!("Failed to copy data to {:?}", target))
        .map_err(EntryError::Fatal)?;
    if copied != size {
        return Err(EntryError::Fatal(anyhow!(TarxError::Format(format!(
            "entry {:?} is truncated: expected {} bytes, found {}",
            name, size, copied
        )))));
    }

    // mtime goes through the open handle, before the mode might drop write access.
    io::set_mtime(&file, &target, mtime);
    io::set_mode(&target, mode).map_err(EntryError::Skippable)?;
    stats.files += 1;
    stats.bytes += copied;
    info!("x {}", name.display());
    Ok(())
}

fn skip_special_entry(name: &Path, entry_type: EntryType) {
    match entry_type {
        EntryType::XGlobalHeader | EntryType::XHeader => {
            debug!("Ignoring extended header entry {:?}", name)
        }
        other => warn!(
            "Skipping {:?}: unsupported entry type {:?}",
            name, other
        ),
    }
}

/// Applies directory permissions and mtimes, deepest directories first.
fn apply_directory_metadata(
    mut pending_dirs: Vec<PendingDir>,
    settings: &ArchiveSettings,
    stats: &mut ExtractStats,
) -> Result<()> {
    pending_dirs.sort_by_key(|dir| std::cmp::Reverse(dir.path.components().count()));
    for dir in pending_dirs {
        if let Ok(handle) = File::open(&dir.path) {
            io::set_mtime(&handle, &dir.path, dir.mtime);
        }
        if let Err(e) = io::set_mode(&dir.path, dir.mode) {
            EntryError::Skippable(e).handle(settings.on_error, &mut stats.skipped)?;
        }
    }
    Ok(())
}
