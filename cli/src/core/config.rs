//! # tarx Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module turns the parsed command line and the optional configuration
//! files into one effective `RunConfig`. The `RunConfig` is built once in
//! `main.rs` and passed by reference into the archive writer and reader; no
//! other part of the program reads flags or global state.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Explicit command-line flags (`-f`, `--keep-going` / `--fail-fast`, `--level`)
//! 2. A file passed with `--config`, or else the project-specific
//!    `.tarx.toml` found in the current directory or its ancestors
//! 3. The user-specific `config.toml` in the platform config directory
//! 4. Default values defined in the code
//!
//! The positional arguments are interpreted according to the mode:
//! archive mode takes one or more roots, extract mode takes exactly one
//! extraction directory. Violations become `TarxError::Usage`.
//!
//! ## Examples
//!
//! Configuration file format:
//!
//! ```toml
//! archive = "~/backups/home.tar.gz"
//! on_error = "continue"
//! compression_level = 9
//! ```
//!
//! Loading the effective configuration:
//!
//! ```rust
//! let cli = Cli::parse();
//! let run_config = config::load_run_config(&cli.run)?;
//! match &run_config.mode {
//!     Mode::Create { roots } => println!("archiving {} roots", roots.len()),
//!     Mode::Extract { target } => println!("extracting into {}", target.display()),
//! }
//! ```
//!
use crate::core::error::{Result, TarxError};
use anyhow::{anyhow, Context};
use clap::Args;
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Archive name used when neither `-f` nor a configuration file sets one.
pub const DEFAULT_ARCHIVE: &str = "out.tar.gz";

/// Gzip level used when none is configured (flate2's default level).
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

const PROJECT_CONFIG_FILENAME: &str = ".tarx.toml";

/// # Run Arguments (`RunArgs`)
///
/// The archiving flags and positional paths, flattened into the top-level
/// `Cli` in `main.rs`. Flags that can also come from a configuration file are
/// `Option`s so an explicit flag can be told apart from a default.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Extract from the archive instead of creating it.
    #[arg(short = 'x', long = "extract")]
    pub extract: bool,

    /// Archive file name. A `.gz` or `.gzip` suffix selects gzip compression.
    /// Defaults to `out.tar.gz`.
    #[arg(short = 'f', long = "file", value_name = "ARCHIVE")]
    pub file: Option<PathBuf>,

    /// Skip entries that fail and keep going, reporting the failures at the end.
    #[arg(long, conflicts_with = "fail_fast")]
    pub keep_going: bool,

    /// Stop at the first failing entry, even if a configuration file says `on_error = "continue"`.
    #[arg(long)]
    pub fail_fast: bool,

    /// Gzip compression level (0-9) for `.gz` / `.gzip` archives.
    #[arg(long, value_name = "N")]
    pub level: Option<u32>,

    /// Read settings from this TOML file instead of searching for `.tarx.toml`.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Archive mode: files and directories to archive.
    /// Extract mode: the directory to extract into.
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,
}

/// What to do when a single entry fails during a walk or an extraction.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Abort the whole operation on the first error.
    #[default]
    FailFast,
    /// Log the failure, skip the entry and continue.
    Continue,
}

/// Settings consumed by the archive writer and reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSettings {
    pub on_error: ErrorPolicy,
    pub compression_level: u32,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            on_error: ErrorPolicy::FailFast,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// The operation selected on the command line, with its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Pack every root into the archive.
    Create { roots: Vec<PathBuf> },
    /// Unpack the archive into `target`.
    Extract { target: PathBuf },
}

/// # Effective Run Configuration (`RunConfig`)
///
/// The validated result of merging flags, configuration files and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: Mode,
    /// Path of the archive to create or read.
    pub archive: PathBuf,
    pub settings: ArchiveSettings,
}

/// Contents of a `.tarx.toml` / `config.toml` file. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default archive path (can use ~).
    pub archive: Option<String>,
    pub on_error: Option<ErrorPolicy>,
    pub compression_level: Option<u32>,
}

/// # Load Run Configuration (`load_run_config`)
///
/// Loads the configuration files, merges them with the command-line
/// arguments and validates the result.
///
/// ## Errors
///
/// Returns an error if a configuration file cannot be read or parsed, if a
/// configured value is invalid, or if the positional arguments do not fit the
/// selected mode (`TarxError::Usage`).
pub fn load_run_config(args: &RunArgs) -> Result<RunConfig> {
    let file_config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            load_config_from_path(path)?
        }
        None => {
            let user = load_user_config()?;
            let project = load_project_config()?;
            merge_file_configs(user.unwrap_or_default(), project)
        }
    };
    let run_config = resolve_run_config(args, file_config)?;
    debug!("Effective run configuration: {:?}", run_config);
    Ok(run_config)
}

/// Combines parsed arguments with file settings. Explicit flags win.
pub fn resolve_run_config(args: &RunArgs, file: FileConfig) -> Result<RunConfig> {
    let mode = resolve_mode(args)?;

    let archive = match (&args.file, &file.archive) {
        (Some(flag), _) => flag.clone(),
        (None, Some(configured)) => PathBuf::from(shellexpand::tilde(configured).into_owned()),
        (None, None) => PathBuf::from(DEFAULT_ARCHIVE),
    };
    if archive.as_os_str().is_empty() {
        return Err(anyhow!(TarxError::Usage(
            "archive file name must not be empty".to_string()
        )));
    }

    let on_error = if args.keep_going {
        ErrorPolicy::Continue
    } else if args.fail_fast {
        ErrorPolicy::FailFast
    } else {
        file.on_error.unwrap_or_default()
    };
    let compression_level = args
        .level
        .or(file.compression_level)
        .unwrap_or(DEFAULT_COMPRESSION_LEVEL);

    let run_config = RunConfig {
        mode,
        archive,
        settings: ArchiveSettings {
            on_error,
            compression_level,
        },
    };
    validate_run_config(&run_config)?;
    Ok(run_config)
}

fn resolve_mode(args: &RunArgs) -> Result<Mode> {
    if args.extract {
        match args.paths.as_slice() {
            [target] => Ok(Mode::Extract {
                target: target.clone(),
            }),
            _ => Err(anyhow!(TarxError::Usage(
                "invalid args - extract mode requires exactly one destination directory"
                    .to_string()
            ))),
        }
    } else if args.paths.is_empty() {
        Err(anyhow!(TarxError::Usage(
            "missing files to create archive".to_string()
        )))
    } else {
        Ok(Mode::Create {
            roots: args.paths.clone(),
        })
    }
}

fn validate_run_config(config: &RunConfig) -> Result<()> {
    if config.settings.compression_level > 9 {
        return Err(anyhow!(TarxError::Config(format!(
            "Invalid compression level {}. Expected a value between 0 and 9.",
            config.settings.compression_level
        ))));
    }
    Ok(())
}

fn load_user_config() -> Result<Option<FileConfig>> {
    let Some(proj_dirs) = ProjectDirs::from("", "", "tarx") else {
        debug!("Could not determine user config directory.");
        return Ok(None);
    };
    let config_path = proj_dirs.config_dir().join("config.toml");
    if config_path.is_file() {
        info!("Loading user configuration from: {}", config_path.display());
        load_config_from_path(&config_path).map(Some)
    } else {
        debug!(
            "User configuration file not found at {}",
            config_path.display()
        );
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<FileConfig>> {
    let current_dir = env::current_dir().context("Failed to get current directory")?;
    match find_project_config_path(&current_dir) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            load_config_from_path(&path).map(Some)
        }
        None => {
            debug!("No {} found in current directory or ancestors.", PROJECT_CONFIG_FILENAME);
            Ok(None)
        }
    }
}

/// Walks up from `start` looking for `.tarx.toml`, stopping at a `.git` directory.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(PROJECT_CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                dir.display()
            );
            return None;
        }
    }
    None
}

fn load_config_from_path(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .map_err(|e| TarxError::Config(e.to_string()))
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project settings override user settings key by key.
fn merge_file_configs(user: FileConfig, project: Option<FileConfig>) -> FileConfig {
    let Some(project) = project else {
        return user;
    };
    FileConfig {
        archive: project.archive.or(user.archive),
        on_error: project.on_error.or(user.on_error),
        compression_level: project.compression_level.or(user.compression_level),
    }
}
