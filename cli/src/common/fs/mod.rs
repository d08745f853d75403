//! # tarx Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! Filesystem helpers shared by the archive writer and reader. Callers import
//! the specific submodule, e.g. `use crate::common::fs::io;`.
//!

/// Directory creation, file replacement, permission and mtime restore, cleanup.
pub mod io;
