//! # tarx Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the infrastructure shared by every mode of tarx:
//! configuration loading and the error taxonomy.
//!
//! ## Architecture
//!
//! - `config`: command-line arguments, configuration files and the effective `RunConfig`
//! - `error`: `TarxError` and the `Result` alias used across the crate
//!
//! ## Usage
//!
//! ```rust
//! use crate::core::config::{self, RunConfig}; // For loading configuration
//! use crate::core::error::{Result, TarxError}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
