//! # tarx Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Root of the shared modules used by the command handlers. Keeps the archive
//! engine and filesystem helpers apart from command-specific logic
//! (`commands::`) and core infrastructure (`core::`).
//!
//! ## Architecture
//!
//! - **`archive`**: the archive engine: writer, reader, compression adapter and entry naming.
//! - **`fs`**: filesystem helpers (directory creation, permissions, cleanup).
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::{reader, writer};
//! use crate::common::fs::io;
//! ```
//!

/// The archive engine: tar writer/reader, gzip adapter, entry naming.
pub mod archive;
/// Filesystem helpers (directory creation, permissions, cleanup).
pub mod fs;
