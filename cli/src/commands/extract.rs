//! # tarx Archive Extraction (`commands::extract`)
//!
//! File: cli/src/commands/extract.rs
//!
//! ## Overview
//!
//! Handler for extract mode (`-x`): unpacks the configured archive into the
//! single directory given on the command line.
//!
//! ```bash
//! tarx -x -f backup.tar.gz restore/
//! ```
//!
use crate::common::archive::reader;
use crate::core::config::RunConfig;
use crate::core::error::{Result, TarxError};
use anyhow::anyhow;
use std::path::Path;
use tracing::{info, warn};

/// # Handle Extract (`handle_extract`)
///
/// Reads `config.archive` and recreates its entries under `target`.
///
/// ## Errors
///
/// Propagates any reader error. A `--keep-going` run that skipped entries
/// returns `TarxError::PartialFailure` once extraction has finished.
pub fn handle_extract(target: &Path, config: &RunConfig) -> Result<()> {
    info!(
        "Extracting {} into {}",
        config.archive.display(),
        target.display()
    );

    let stats = reader::read_archive(&config.archive, target, &config.settings)?;
    info!(
        "Extracted {} files and {} directories ({} bytes)",
        stats.files, stats.directories, stats.bytes
    );

    if stats.skipped > 0 {
        warn!("{} entries were skipped", stats.skipped);
        return Err(anyhow!(TarxError::PartialFailure {
            failed: stats.skipped
        }));
    }
    Ok(())
}
