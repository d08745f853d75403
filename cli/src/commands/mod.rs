//! # tarx Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! tarx has two modes, selected by the `-x` flag. Each mode has a handler
//! module; `run` dispatches the effective `RunConfig` to the right one.
//!
//! - `create`: archive mode (default), packs roots into the archive
//! - `extract`: extract mode, unpacks the archive into one directory
//!
use crate::core::config::{Mode, RunConfig};
use crate::core::error::Result;

/// Archive mode: packs the given roots into the archive file.
pub mod create;
/// Extract mode: unpacks the archive file into a directory.
pub mod extract;

/// Runs the operation selected by `config.mode`.
pub fn run(config: &RunConfig) -> Result<()> {
    match &config.mode {
        Mode::Create { roots } => create::handle_create(roots, config),
        Mode::Extract { target } => extract::handle_extract(target, config),
    }
}
