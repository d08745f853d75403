//! # tarx Archive Creation (`commands::create`)
//!
//! File: cli/src/commands/create.rs
//!
//! ## Overview
//!
//! Handler for archive mode (the default): packs every root given on the
//! command line into the configured archive file.
//!
//! ```bash
//! tarx -f backup.tar.gz ~/notes ~/projects/site
//! tarx -f src.tar --keep-going src
//! ```
//!
use crate::common::archive::writer;
use crate::core::config::RunConfig;
use crate::core::error::{Result, TarxError};
use anyhow::anyhow;
use std::path::PathBuf;
use tracing::{info, warn};

/// # Handle Create (`handle_create`)
///
/// Writes `roots` into `config.archive` using `config.settings`.
///
/// ## Errors
///
/// Propagates any writer error. A `--keep-going` run that skipped entries
/// returns `TarxError::PartialFailure` after the archive has been completed.
pub fn handle_create(roots: &[PathBuf], config: &RunConfig) -> Result<()> {
    info!(
        "Creating archive {} from {} root(s)",
        config.archive.display(),
        roots.len()
    );

    let stats = writer::write_archive(roots, &config.archive, &config.settings)?;
    info!(
        "Archived {} entries ({} bytes) into {}",
        stats.entries,
        stats.bytes,
        config.archive.display()
    );

    if stats.skipped > 0 {
        warn!("{} entries were skipped", stats.skipped);
        return Err(anyhow!(TarxError::PartialFailure {
            failed: stats.skipped
        }));
    }
    Ok(())
}
