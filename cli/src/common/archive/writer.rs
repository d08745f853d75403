//! # tarx Archive Writer (`common::archive::writer`)
//!
//! File: cli/src/common/archive/writer.rs
//!
//! ## Overview
//!
//! Packs one or more roots (files or directories) into a tar archive,
//! optionally gzip-compressed according to the archive's file name.
//!
//! ## Architecture
//!
//! 1. The destination is resolved to an absolute path, created (or
//!    truncated) and wrapped by the compression adapter before the
//!    `tar::Builder` is constructed on top of it.
//! 2. Each root is walked depth-first in pre-order with `walkdir`, siblings
//!    sorted by name. Every directory and regular file becomes one entry:
//!    a header built from the object's metadata (permission bits and mtime
//!    copied verbatim), followed by the file's bytes for regular files.
//!    Symlinks are not followed; they and other special files are skipped.
//! 3. The destination file itself is never archived, even if it lies inside
//!    a root. An entry name already written by an earlier root (for example
//!    the same root given twice) is skipped, so no name appears twice.
//! 4. On success the layers are closed in order: tar end-of-archive marker,
//!    gzip trailer, buffered file. On failure the incomplete destination is
//!    deleted and the first error is returned.
//!
//! ## Usage
//!
//! ```rust
//! let stats = writer::write_archive(&[PathBuf::from("root")], Path::new("out.tar.gz"), &settings)?;
//! println!("{} entries, {} bytes", stats.entries, stats.bytes);
//! ```
//!
use crate::common::archive::compression::Compression;
use crate::common::archive::{names, EntryError};
use crate::common::fs::io; // Partial-output cleanup
use crate::core::config::ArchiveSettings;
use crate::core::error::{Result, TarxError};
use anyhow::{anyhow, Context};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self as stdio, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Builder, Header}; // Tar serialization
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir}; // Depth-first traversal of each root

/// Totals for one `write_archive` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteStats {
    /// Entries written (files and directories).
    pub entries: usize,
    /// File body bytes written, before compression.
    pub bytes: u64,
    /// Objects skipped because of errors (only under `ErrorPolicy::Continue`).
    pub skipped: usize,
}

/// # Write Archive (`write_archive`)
///
/// Creates `destination` and archives every root into it.
///
/// ## Errors
///
/// Returns an `Err` if:
/// - The destination path cannot be resolved or created.
/// - A root does not exist or cannot be read.
/// - Any file or directory cannot be read while walking (fail-fast policy).
/// - Finishing the tar stream, the gzip stream or the file fails.
///
/// When an error is returned no file is left at `destination`.
pub fn write_archive(
    roots: &[PathBuf],
    destination: &Path,
    settings: &ArchiveSettings,
) -> Result<WriteStats> {
    let destination = std::path::absolute(destination).map_err(|e| {
        anyhow!(TarxError::PathResolution {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        })
    })?;
    let compression = Compression::from_path(&destination);
    debug!(
        "Writing archive {:?} with compression {:?}",
        destination, compression
    );

    // Create (or truncate) the destination before any root is walked.
    let file = File::create(&destination)
        .with_context(|| format!("Failed to create archive file {:?}", destination))?;

    let result = write_entries(file, compression, roots, &destination, settings);
    if result.is_err() {
        // Never leave a truncated archive that still looks valid.
        io::remove_partial_file(&destination);
    }
    result
}

/// Streams every root into `file`. All handles are dropped before returning.
fn write_entries(
    file: File,
    compression: Compression,
    roots: &[PathBuf],
    destination: &Path,
    settings: &ArchiveSettings,
) -> Result<WriteStats> {
    // The file exists now, so its canonical path can be compared against walked paths.
    let excluded = destination
        .canonicalize()
        .with_context(|| format!("Failed to resolve archive path {:?}", destination))?;

    // Buffered file, optional gzip layer, tar builder on top.
    let sink = compression.wrap_writer(file, settings.compression_level);
    let mut builder = Builder::new(sink);
    let mut stats = WriteStats::default();
    let mut emitted = HashSet::new();

    for root in roots {
        let mut walk = RootWalk {
            excluded: &excluded,
            settings,
            emitted: &mut emitted,
            stats: &mut stats,
        };
        walk.append_root(&mut builder, root)
            .with_context(|| format!("Failed to archive {:?}", root))?;
    }

    // Close in order: end-of-archive marker, gzip trailer, file.
    let sink = builder
        .into_inner()
        .context("Failed to finalize tar archive structure")?;
    let file = sink
        .finish()
        .context("Failed to finish archive compression stream")?;
    file.sync_all()
        .with_context(|| format!("Failed to close archive file {:?}", destination))?;

    Ok(stats)
}

/// State shared by every root of one `write_archive` run.
struct RootWalk<'a> {
    /// Canonical path of the archive being written.
    excluded: &'a Path,
    settings: &'a ArchiveSettings,
    /// Entry names already written.
    emitted: &'a mut HashSet<PathBuf>,
    stats: &'a mut WriteStats,
}

impl RootWalk<'_> {
    /// Walks one root and appends an entry for every object below it.
    fn append_root<W: Write>(&mut self, builder: &mut Builder<W>, root: &Path) -> Result<()> {
        // A missing root fails the run whatever the error policy.
        fs::symlink_metadata(root)
            .with_context(|| format!("Failed to read archive root {:?}", root))?;
        let prefix = names::root_prefix(root);
        debug!("Walking root {:?} (entry prefix {:?})", root, prefix);

        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        for walk_result in walker {
            let outcome = match walk_result {
                Ok(entry) => self.append_entry(builder, &entry, root, prefix.as_deref()),
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf);
                    Err(EntryError::Skippable(
                        anyhow::Error::from(e)
                            .context(format!("Failed to walk directory at {:?}", path)),
                    ))
                }
            };
            if let Err(e) = outcome {
                e.handle(self.settings.on_error, &mut self.stats.skipped)?;
            }
        }
        Ok(())
    }

    /// Appends the header (and body, for regular files) of one walked object.
    fn append_entry<W: Write>(
        &mut self,
        builder: &mut Builder<W>,
        entry: &DirEntry,
        root: &Path,
        prefix: Option<&Path>,
    ) -> std::result::Result<(), EntryError> {
        let path = entry.path();
        let file_type = entry.file_type();

        if !file_type.is_dir() && !file_type.is_file() {
            warn!("Skipping {:?}: not a regular file or directory", path);
            return Ok(());
        }
        if file_type.is_file() && is_destination(path, self.excluded) {
            debug!("Skipping {:?}: it is the archive being written", path);
            return Ok(());
        }

        let Some(name) = names::entry_name(root, prefix, path).map_err(EntryError::Skippable)?
        else {
            return Ok(());
        };
        if self.emitted.contains(&name) {
            warn!("Skipping {:?}: entry {} was already archived", path, name.display());
            return Ok(());
        }

        if file_type.is_dir() {
            let meta = entry
                .metadata()
                .with_context(|| format!("Failed to read metadata of {:?}", path))
                .map_err(EntryError::Skippable)?;
            // Directory entries carry mode and mtime but no body.
            let mut header = Header::new_gnu();
            header.set_metadata(&meta);
            builder
                .append_data(&mut header, &name, stdio::empty())
                .with_context(|| format!("Failed to write directory entry {:?}", name))
                .map_err(EntryError::Fatal)?;
        } else {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {:?}", path))
                .map_err(EntryError::Skippable)?;
            // Metadata comes from the open handle so header and body describe the same file.
            let meta = file
                .metadata()
                .with_context(|| format!("Failed to read metadata of {:?}", path))
                .map_err(EntryError::Skippable)?;
            let mut header = Header::new_gnu();
            header.set_metadata(&meta);
            // Once the header is out, any failure leaves the stream unusable.
            builder
                .append_data(&mut header, &name, SizedBody::new(file, meta.len()))
                .with_context(|| format!("Failed to write file entry {:?} from {:?}", name, path))
                .map_err(EntryError::Fatal)?;
            self.stats.bytes += meta.len();
        }

        self.stats.entries += 1;
        info!("a {}", name.display());
        self.emitted.insert(name);
        Ok(())
    }
}

/// Whether `path` is the archive file being written.
fn is_destination(path: &Path, excluded: &Path) -> bool {
    if path.file_name() != excluded.file_name() {
        return false;
    }
    path.canonicalize()
        .map(|canonical| canonical == excluded)
        .unwrap_or(false)
}

/// Reads exactly `remaining` bytes from a file being archived.
///
/// The tar header already declares the size, so a file that shrinks while it
/// is copied is an error instead of a short entry.
struct SizedBody<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> SizedBody<R> {
    fn new(inner: R, size: u64) -> Self {
        Self {
            inner,
            remaining: size,
        }
    }
}

impl<R: Read> Read for SizedBody<R> {
    fn read(&mut self, buf: &mut [u8]) -> stdio::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = buf
            .len()
            .min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let read = self.inner.read(&mut buf[..max])?;
        if read == 0 {
            return Err(stdio::Error::new(
                ErrorKind::UnexpectedEof,
                format!("file shrank while being archived ({} bytes missing)", self.remaining),
            ));
        }
        self.remaining -= read as u64;
        Ok(read)
    }
}
