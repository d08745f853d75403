//! # tarx Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error taxonomy used throughout tarx. Specific,
//! user-facing failure classes are variants of `TarxError` (built with
//! `thiserror`), while propagation uses `anyhow::Result` so every layer can
//! attach the operation and path it was working on via `anyhow::Context`.
//!
//! ## Architecture
//!
//! - `TarxError`: the failure classes a caller may want to tell apart
//!   (usage, path resolution, malformed archives, traversal guard, ...).
//! - Plain I/O failures stay `std::io::Error`, wrapped in context such as
//!   `Failed to create archive file "out.tar"`.
//! - `Result<T>`: alias for `anyhow::Result<T>`.
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if paths.is_empty() {
//!     anyhow::bail!(TarxError::Usage("missing files to create archive".into()));
//! }
//!
//! // Add context to I/O errors
//! let file = File::open(&path)
//!     .with_context(|| format!("Failed to open archive file {:?}", path))?;
//!
//! // Check which class of error occurred
//! if let Some(TarxError::TraversalGuard { name }) = find_tarx_error(&err) {
//!     println!("rejected entry {}", name);
//! }
//! ```
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for tarx.
#[derive(Error, Debug)]
pub enum TarxError {
    /// Malformed command-line invocation.
    #[error("Usage error: {0}")]
    Usage(String),

    /// An absolute or relative path could not be computed.
    #[error("Failed to resolve path {path:?}: {reason}")]
    PathResolution { path: PathBuf, reason: String },

    /// Malformed header or truncated stream while reading an archive.
    #[error("Malformed archive: {0}")]
    Format(String),

    /// An archive entry would be written outside the extraction target.
    #[error("Entry '{name}' resolves outside the extraction directory")]
    TraversalGuard { name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// A `--keep-going` run completed but skipped some entries.
    #[error("{failed} {} could not be processed", entry_noun(.failed))]
    PartialFailure { failed: usize },
}

fn entry_noun(count: &usize) -> &'static str {
    if *count == 1 {
        "entry"
    } else {
        "entries"
    }
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

/// Finds the first `TarxError` in an error's cause chain, if any.
///
/// Context layers added with `anyhow::Context` sit on top of the original
/// error, so the classification is looked up along the whole chain.
pub fn find_tarx_error(err: &anyhow::Error) -> Option<&TarxError> {
    err.chain().find_map(|cause| cause.downcast_ref::<TarxError>())
}
