//! Basic functionality integration tests for gcp CLI.

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::TestFixture;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_basic_file_copy() {
    let fx = TestFixture::new();
    fs::write(fx.src.path().join("test.txt"), "hello world").unwrap();

    cargo_bin_cmd!("gcp")
        .arg(fx.src.path().join("test.txt"))
        .arg(fx.dest("test.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied 1 files"));

    fx.assert_file_content(&fx.dest("test.txt"), "hello world");
}

#[test]
fn test_directory_copy_creates_missing_parents() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();

    cargo_bin_cmd!("gcp")
        .arg(&tree)
        .arg(fx.dest("a/b/copied"))
        .assert()
        .success();

    fx.assert_file_content(&fx.dest("a/b/copied/f1.txt"), "one");
    fx.assert_file_content(&fx.dest("a/b/copied/sub/f2.txt"), "two");
    assert_eq!(fx.count_files_recursive(&fx.dest("a/b/copied")), 2);
}

#[test]
fn test_overwrites_by_default() {
    let fx = TestFixture::new();
    fs::write(fx.src.path().join("test.txt"), "new").unwrap();
    fs::write(fx.dest("test.txt"), "old").unwrap();

    cargo_bin_cmd!("gcp")
        .arg(fx.src.path().join("test.txt"))
        .arg(fx.dest("test.txt"))
        .assert()
        .success();

    fx.assert_file_content(&fx.dest("test.txt"), "new");
}

#[test]
fn test_no_clobber_keeps_existing() {
    let fx = TestFixture::new();
    fs::write(fx.src.path().join("test.txt"), "new").unwrap();
    fs::write(fx.dest("test.txt"), "old").unwrap();

    cargo_bin_cmd!("gcp")
        .arg("-n")
        .arg(fx.src.path().join("test.txt"))
        .arg(fx.dest("test.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to copy (1 files already exist)"));

    fx.assert_file_content(&fx.dest("test.txt"), "old");
}

#[test]
fn test_exclude_skips_whole_subtree() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();

    cargo_bin_cmd!("gcp")
        .arg("--exclude")
        .arg("sub")
        .arg(&tree)
        .arg(fx.dest("copied"))
        .assert()
        .success();

    assert!(fx.dest("copied/f1.txt").exists());
    assert!(!fx.dest("copied/sub").exists());
}

#[test]
fn test_exclude_is_repeatable() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();
    fs::write(tree.join("f3.txt"), "three").unwrap();

    cargo_bin_cmd!("gcp")
        .args(["--exclude", "f1.txt", "--exclude", "f2.txt"])
        .arg(&tree)
        .arg(fx.dest("copied"))
        .assert()
        .success();

    assert!(!fx.dest("copied/f1.txt").exists());
    assert!(!fx.dest("copied/sub/f2.txt").exists());
    fx.assert_file_content(&fx.dest("copied/f3.txt"), "three");
}

#[test]
fn test_verbose_prints_breakdown() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();

    cargo_bin_cmd!("gcp")
        .arg("-v")
        .arg(&tree)
        .arg(fx.dest("copied"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Files copied:   2"))
        .stdout(predicate::str::contains("Directories:    2"));
}

#[cfg(unix)]
mod unix_tests {
    use super::*;
    use crate::common::mode_of;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_modes_are_copied() {
        let fx = TestFixture::new();
        let tree = fx.sample_tree();
        fs::set_permissions(tree.join("f1.txt"), fs::Permissions::from_mode(0o600)).unwrap();
        fs::set_permissions(tree.join("sub"), fs::Permissions::from_mode(0o750)).unwrap();

        cargo_bin_cmd!("gcp")
            .arg(&tree)
            .arg(fx.dest("copied"))
            .assert()
            .success();

        assert_eq!(mode_of(&fx.dest("copied/f1.txt")), 0o600);
        assert_eq!(mode_of(&fx.dest("copied/sub")), 0o750);
    }

    #[test]
    fn test_preserve_timestamps() {
        let fx = TestFixture::new();
        let src = fx.src.path().join("old.txt");
        fs::write(&src, "old").unwrap();

        // 2001-09-09, far from "now"
        let mtime = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        fs::File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        cargo_bin_cmd!("gcp")
            .arg("-p")
            .arg(&src)
            .arg(fx.dest("old.txt"))
            .assert()
            .success();

        let copied = fs::metadata(fx.dest("old.txt")).unwrap().modified().unwrap();
        assert_eq!(copied, mtime);
    }

    #[test]
    fn test_without_preserve_timestamps_mtime_is_fresh() {
        let fx = TestFixture::new();
        let src = fx.src.path().join("old.txt");
        fs::write(&src, "old").unwrap();
        let mtime = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        fs::File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        cargo_bin_cmd!("gcp")
            .arg(&src)
            .arg(fx.dest("old.txt"))
            .assert()
            .success();

        let copied = fs::metadata(fx.dest("old.txt")).unwrap().modified().unwrap();
        assert_ne!(copied, mtime);
    }
}
