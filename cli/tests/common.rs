//! # tarx CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each test file
//! declares `mod common;` and drives the compiled `tarx` binary through
//! `assert_cmd`.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

/// # Get tarx Command (`tarx_cmd`)
///
/// Creates an `assert_cmd::Command` for the compiled `tarx` binary, running
/// in `dir` so that no `.tarx.toml` from the developer's tree is picked up
/// and relative paths resolve inside the test's temporary directory.
///
/// ## Panics
/// Panics if the `tarx` binary cannot be found via `Command::cargo_bin`.
pub fn tarx_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tarx").expect("Failed to find tarx binary for testing");
    cmd.current_dir(dir);
    // A dedicated empty config file keeps user-level settings out of the test.
    let config = dir.join(".tarx-test.toml");
    if !config.exists() {
        fs::write(&config, "").expect("Failed to write empty test config");
    }
    cmd.arg("--config").arg(config);
    cmd
}

/// Builds `root/{a.txt = "hi", sub/b.txt = ""}` inside `base` and returns `base/root`.
pub fn create_sample_tree(base: &Path) -> PathBuf {
    let root = base.join("root");
    fs::create_dir_all(root.join("sub")).expect("Failed to create sample tree");
    fs::write(root.join("a.txt"), "hi").expect("Failed to write a.txt");
    fs::write(root.join("sub/b.txt"), "").expect("Failed to write b.txt");
    root
}
