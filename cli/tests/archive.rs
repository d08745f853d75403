//! # tarx CLI Archive Round-Trip Integration Tests
//!
//! File: cli/tests/archive.rs
//!
//! ## Overview
//!
//! End-to-end tests that archive a tree with `tarx`, extract it again with
//! `tarx -x`, and compare the result. They cover gzip selection by suffix,
//! self-exclusion of the archive, the traversal guard, error reporting and
//! configuration-file defaults.
//!

mod common;
use common::*;
use flate2::read::GzDecoder;
use predicates::prelude::*;
use std::fs::{self, File};
use tempfile::tempdir;

/// `root/{a.txt, sub/b.txt}` -> `out.tar` -> `dest/root/...`
#[test]
fn test_end_to_end_plain_tar() {
    let temp_dir = tempdir().unwrap();
    create_sample_tree(temp_dir.path());

    tarx_cmd(temp_dir.path())
        .args(["-f", "out.tar", "root"])
        .assert()
        .success();
    tarx_cmd(temp_dir.path())
        .args(["-x", "-f", "out.tar", "dest"])
        .assert()
        .success();

    let dest = temp_dir.path().join("dest");
    assert_eq!(fs::read_to_string(dest.join("root/a.txt")).unwrap(), "hi");
    assert_eq!(fs::read_to_string(dest.join("root/sub/b.txt")).unwrap(), "");
}

/// A `.tar` archive is readable without any decompression.
#[test]
fn test_plain_tar_readable_by_tar_crate() {
    let temp_dir = tempdir().unwrap();
    create_sample_tree(temp_dir.path());

    tarx_cmd(temp_dir.path())
        .args(["-f", "out.tar", "root"])
        .assert()
        .success();

    let mut archive = tar::Archive::new(File::open(temp_dir.path().join("out.tar")).unwrap());
    let names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            name.trim_end_matches('/').to_string()
        })
        .collect();
    assert_eq!(names, ["root", "root/a.txt", "root/sub", "root/sub/b.txt"]);
}

/// The default archive name is `out.tar.gz`, which is gzip-compressed.
#[test]
fn test_default_archive_is_gzip() {
    let temp_dir = tempdir().unwrap();
    create_sample_tree(temp_dir.path());

    tarx_cmd(temp_dir.path()).arg("root").assert().success();

    let archive_path = temp_dir.path().join("out.tar.gz");
    let raw = fs::read(&archive_path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    let mut archive = tar::Archive::new(GzDecoder::new(raw.as_slice()));
    assert_eq!(archive.entries().unwrap().count(), 4);

    tarx_cmd(temp_dir.path())
        .args(["-x", "dest"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("dest/root/a.txt")).unwrap(),
        "hi"
    );
}

#[test]
fn test_gzip_suffix_round_trip() {
    let temp_dir = tempdir().unwrap();
    create_sample_tree(temp_dir.path());

    tarx_cmd(temp_dir.path())
        .args(["-f", "backup.gzip", "root"])
        .assert()
        .success();
    tarx_cmd(temp_dir.path())
        .args(["-x", "-f", "backup.gzip", "restore"])
        .assert()
        .success();

    assert!(temp_dir.path().join("restore/root/sub").is_dir());
}

/// Archiving the directory that will hold the archive does not embed it.
#[test]
fn test_archive_inside_root_is_excluded() {
    let temp_dir = tempdir().unwrap();
    create_sample_tree(temp_dir.path());

    tarx_cmd(temp_dir.path())
        .args(["-f", "root/self.tar", "root"])
        .assert()
        .success();
    tarx_cmd(temp_dir.path())
        .args(["-x", "-f", "root/self.tar", "dest"])
        .assert()
        .success();

    assert!(temp_dir.path().join("dest/root/a.txt").exists());
    assert!(!temp_dir.path().join("dest/root/self.tar").exists());
}

/// Roots given as absolute paths are named by their final component.
#[test]
fn test_absolute_root_is_named_by_final_component() {
    let temp_dir = tempdir().unwrap();
    let root = create_sample_tree(temp_dir.path());

    tarx_cmd(temp_dir.path())
        .arg("-f")
        .arg("out.tar")
        .arg(&root)
        .assert()
        .success();
    tarx_cmd(temp_dir.path())
        .args(["-x", "-f", "out.tar", "dest"])
        .assert()
        .success();

    assert!(temp_dir.path().join("dest/root/sub/b.txt").exists());
}

#[test]
fn test_extract_twice_into_same_directory() {
    let temp_dir = tempdir().unwrap();
    create_sample_tree(temp_dir.path());
    tarx_cmd(temp_dir.path())
        .args(["-f", "out.tar", "root"])
        .assert()
        .success();

    for _ in 0..2 {
        tarx_cmd(temp_dir.path())
            .args(["-x", "-f", "out.tar", "dest"])
            .assert()
            .success();
    }
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("dest/root/a.txt")).unwrap(),
        "hi"
    );
}

/// Writes `evil.tar`: a `../escape.txt` entry followed by a regular `ok.txt`.
fn write_traversal_archive(dir: &std::path::Path) {
    let mut builder = tar::Builder::new(File::create(dir.join("evil.tar")).unwrap());
    let entries: [(&[u8], &[u8]); 2] = [(b"../escape.txt", b"evil"), (b"ok.txt", b"fine")];
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, data).unwrap();
    }
    builder.into_inner().unwrap();
}

/// `--fail-fast` beats `on_error = "continue"` from the configuration file.
#[test]
fn test_fail_fast_flag_overrides_config_file() {
    let temp_dir = tempdir().unwrap();
    write_traversal_archive(temp_dir.path());
    let config = temp_dir.path().join("continue.toml");
    fs::write(&config, "on_error = \"continue\"\n").unwrap();
    let run = |extra: &[&str], target: &str| {
        let mut cmd = Command::cargo_bin("tarx").unwrap();
        cmd.current_dir(temp_dir.path())
            .arg("--config")
            .arg(&config)
            .args(extra)
            .args(["-x", "-f", "evil.tar", target]);
        cmd.assert()
    };

    // Configured policy: the bad entry is skipped, the good one extracted.
    run(&[], "continued")
        .failure()
        .stderr(predicate::str::contains("1 entry could not be processed"));
    assert!(temp_dir.path().join("continued/ok.txt").exists());

    run(&["--fail-fast"], "stopped")
        .failure()
        .stderr(predicate::str::contains("resolves outside the extraction directory"));
    assert!(!temp_dir.path().join("stopped/ok.txt").exists());
    assert!(!temp_dir.path().join("escape.txt").exists());
}

/// A later missing root fails the run after earlier roots were written.
#[test]
fn test_missing_second_root_leaves_no_archive() {
    let temp_dir = tempdir().unwrap();
    create_sample_tree(temp_dir.path());

    tarx_cmd(temp_dir.path())
        .args(["-f", "out.tar", "root", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));

    assert!(!temp_dir.path().join("out.tar").exists());
}

/// An entry named `../escape.txt` is rejected and nothing lands outside `dest`.
#[test]
fn test_traversal_entry_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let mut header = tar::Header::new_gnu();
    let name = b"../escape.txt";
    header.as_old_mut().name[..name.len()].copy_from_slice(name);
    header.set_size(4);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();
    let mut builder = tar::Builder::new(File::create(temp_dir.path().join("evil.tar")).unwrap());
    builder.append(&header, &b"evil"[..]).unwrap();
    builder.into_inner().unwrap();

    tarx_cmd(temp_dir.path())
        .args(["-x", "-f", "evil.tar", "dest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("resolves outside the extraction directory"));

    assert!(!temp_dir.path().join("escape.txt").exists());
}

#[test]
fn test_missing_root_fails_and_leaves_no_archive() {
    let temp_dir = tempdir().unwrap();

    tarx_cmd(temp_dir.path())
        .args(["-f", "out.tar", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist"));

    assert!(!temp_dir.path().join("out.tar").exists());
}

#[test]
fn test_corrupt_gzip_archive_is_reported() {
    let temp_dir = tempdir().unwrap();
    fs::write(temp_dir.path().join("bad.tar.gz"), b"definitely not gzip").unwrap();

    tarx_cmd(temp_dir.path())
        .args(["-x", "-f", "bad.tar.gz", "dest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed archive"));
}

/// `--keep-going` archives what it can and still exits non-zero.
#[cfg(unix)]
#[test]
fn test_keep_going_skips_unreadable_file() {
    use std::os::unix::fs::PermissionsExt;
    let temp_dir = tempdir().unwrap();
    let root = create_sample_tree(temp_dir.path());
    let locked = root.join("locked.txt");
    fs::write(&locked, "secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if File::open(&locked).is_ok() {
        // Permission bits are not enforced for this user (e.g. root).
        return;
    }

    tarx_cmd(temp_dir.path())
        .args(["-f", "out.tar", "root"])
        .assert()
        .failure();
    assert!(!temp_dir.path().join("out.tar").exists());

    tarx_cmd(temp_dir.path())
        .args(["--keep-going", "-f", "out.tar", "root"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 entry could not be processed"));
    tarx_cmd(temp_dir.path())
        .args(["-x", "-f", "out.tar", "dest"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("dest/root/a.txt")).unwrap(),
        "hi"
    );
    assert!(!temp_dir.path().join("dest/root/locked.txt").exists());
}

/// The archive name can come from the configuration file.
#[test]
fn test_archive_name_from_config_file() {
    let temp_dir = tempdir().unwrap();
    create_sample_tree(temp_dir.path());
    let config = temp_dir.path().join("custom.toml");
    fs::write(&config, "archive = \"configured.tar\"\n").unwrap();

    Command::cargo_bin("tarx")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(&config)
        .arg("root")
        .assert()
        .success();

    assert!(temp_dir.path().join("configured.tar").exists());
    assert!(!temp_dir.path().join("out.tar.gz").exists());
}

#[test]
fn test_verbose_lists_entries() {
    let temp_dir = tempdir().unwrap();
    create_sample_tree(temp_dir.path());

    tarx_cmd(temp_dir.path())
        .args(["-v", "-f", "out.tar", "root"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("a root/sub/b.txt"));
}
