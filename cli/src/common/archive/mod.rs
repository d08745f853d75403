//! # tarx Archive Engine (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! The archive engine: one pass over a set of roots to produce a tar stream,
//! or one pass over a tar stream to recreate the tree on disk. Both sides
//! share the same abstraction: an entry header followed by the entry body,
//! streamed through the `tar` crate.
//!
//! ## Architecture
//!
//! - **`writer`**: walks roots depth-first and appends one entry per file or directory.
//! - **`reader`**: reads entries sequentially and recreates them under a target directory.
//! - **`compression`**: picks the gzip layer from the archive file name.
//! - **`names`**: maps filesystem paths to entry names and guards extraction paths.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::{reader, writer};
//!
//! let settings = ArchiveSettings::default();
//! writer::write_archive(&[PathBuf::from("root")], Path::new("out.tar"), &settings)?;
//! reader::read_archive(Path::new("out.tar"), Path::new("dest"), &settings)?;
//! ```
//!
use crate::core::config::ErrorPolicy;
use tracing::warn;

pub mod compression;
pub mod names;
pub mod reader;
pub mod writer;

/// Failure while processing a single archive entry.
#[derive(Debug)]
pub(crate) enum EntryError {
    /// Nothing was emitted for the entry; the stream is still consistent and
    /// the operation may continue under `ErrorPolicy::Continue`.
    Skippable(anyhow::Error),
    /// The stream is in an unknown state; the operation must stop.
    Fatal(anyhow::Error),
}

impl EntryError {
    /// Applies the error policy: returns `Ok(())` after logging when the
    /// entry may be skipped, the error otherwise.
    pub(crate) fn handle(self, policy: ErrorPolicy, skipped: &mut usize) -> anyhow::Result<()> {
        match (self, policy) {
            (EntryError::Skippable(e), ErrorPolicy::Continue) => {
                warn!("Skipping entry: {:#}", e);
                *skipped += 1;
                Ok(())
            }
            (EntryError::Skippable(e), ErrorPolicy::FailFast) | (EntryError::Fatal(e), _) => Err(e),
        }
    }
}
