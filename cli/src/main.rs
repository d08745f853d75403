//! # tarx Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file serves as the main entry point for the tarx CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Building the effective run configuration
//! - Routing execution to the archive or extract handler
//!
//! ## Examples
//!
//! ```bash
//! # Archive two directories into a gzip-compressed tarball
//! tarx -f backup.tar.gz notes projects
//!
//! # Extract it again, logging every entry
//! tarx -v -x -f backup.tar.gz restore
//! ```
//!
//! Processing flow:
//! 1. Parse command-line args via Clap
//! 2. Configure logging based on verbosity level
//! 3. Load configuration files and merge them with the flags
//! 4. Run the selected mode, then format and display any error
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Archive and extract handlers
mod common; // Archive engine and filesystem helpers
mod core; // Configuration and error types

use crate::core::config::{self, RunArgs};
use crate::core::error::{find_tarx_error, TarxError};

/// Defines the command-line arguments using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "tarx",
    about = "Pack files and directories into tar/tar.gz archives, or unpack them",
    long_about = "Creates a tar archive from the given files and directories, or with -x \
                  extracts an archive into a directory.\n\
                  Archives whose name ends in .gz or .gzip are gzip-compressed.",
    version
)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result =
        config::load_run_config(&cli.run).and_then(|run_config| commands::run(&run_config));

    if let Err(e) = command_result {
        tracing::debug!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        if let Some(TarxError::Usage(_)) = find_tarx_error(&e) {
            eprintln!("Run 'tarx --help' for usage.");
        }
        std::process::exit(1);
    }

    Ok(())
}
