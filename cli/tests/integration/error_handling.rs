//! Error handling integration tests for gcp CLI.
//!
//! These tests verify proper error handling behaviors:
//! - Files cannot overwrite directories and the reverse
//! - --error-on-exist fails without touching the destination
//! - Copying a tree into itself is refused
//! - Invalid flag combinations exit with status 2

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::TestFixture;
use predicates::prelude::*;
use std::fs;

/// Overwriting a directory with a file must not delete the directory.
#[test]
fn test_overwrite_directory_with_file_fails() {
    let fx = TestFixture::new();
    fs::write(fx.src.path().join("testdir"), "file content").unwrap();
    fs::create_dir(fx.dest("testdir")).unwrap();
    fs::write(fx.dest("testdir/inside.txt"), "inside content").unwrap();

    cargo_bin_cmd!("gcp")
        .arg(fx.src.path().join("testdir"))
        .arg(fx.dest("testdir"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[type_mismatch]"))
        .stderr(predicate::str::contains("Cannot overwrite directory"));

    assert!(fx.dest("testdir").is_dir());
    fx.assert_file_content(&fx.dest("testdir/inside.txt"), "inside content");
}

#[test]
fn test_overwrite_file_with_directory_fails() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();
    fs::write(fx.dest("plain"), "keep").unwrap();

    cargo_bin_cmd!("gcp")
        .arg(&tree)
        .arg(fx.dest("plain"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot overwrite non-directory"));

    fx.assert_file_content(&fx.dest("plain"), "keep");
}

#[test]
fn test_error_on_exist() {
    let fx = TestFixture::new();
    fs::write(fx.src.path().join("test.txt"), "new").unwrap();
    fs::write(fx.dest("test.txt"), "old").unwrap();

    cargo_bin_cmd!("gcp")
        .args(["-n", "--error-on-exist"])
        .arg(fx.src.path().join("test.txt"))
        .arg(fx.dest("test.txt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[already_exists]"));

    fx.assert_file_content(&fx.dest("test.txt"), "old");
}

#[test]
fn test_error_on_exist_requires_no_clobber() {
    let fx = TestFixture::new();
    fs::write(fx.src.path().join("test.txt"), "new").unwrap();

    cargo_bin_cmd!("gcp")
        .arg("--error-on-exist")
        .arg(fx.src.path().join("test.txt"))
        .arg(fx.dest("test.txt"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[invalid_input]"));

    assert!(!fx.dest("test.txt").exists());
}

#[test]
fn test_exclude_must_be_a_name() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();

    cargo_bin_cmd!("gcp")
        .args(["--exclude", "sub/f2.txt"])
        .arg(&tree)
        .arg(fx.dest("copied"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("single file name"));
}

#[test]
fn test_source_not_found() {
    let fx = TestFixture::new();

    cargo_bin_cmd!("gcp")
        .arg(fx.src.path().join("nonexistent.txt"))
        .arg(fx.dest("out.txt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[source_not_found]"))
        .stderr(predicate::str::contains("Source does not exist"));
}

#[test]
fn test_missing_operand_is_usage_error() {
    let fx = TestFixture::new();

    cargo_bin_cmd!("gcp")
        .arg(fx.src.path())
        .assert()
        .code(2);
}

#[test]
fn test_copy_into_itself_fails() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();

    cargo_bin_cmd!("gcp")
        .arg(&tree)
        .arg(tree.join("sub/nested"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[self_copy]"))
        .stderr(predicate::str::contains("subdirectory of itself"));

    assert!(!tree.join("sub/nested").exists());
}

#[test]
fn test_same_path_fails() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();

    cargo_bin_cmd!("gcp")
        .arg(&tree)
        .arg(&tree)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[same_path]"));
}

#[test]
fn test_copy_empty_directory() {
    let fx = TestFixture::new();
    fs::create_dir(fx.src.path().join("empty")).unwrap();

    cargo_bin_cmd!("gcp")
        .arg(fx.src.path().join("empty"))
        .arg(fx.dest("empty"))
        .assert()
        .success();

    assert!(fx.dest("empty").is_dir());
}

#[cfg(unix)]
mod unix_tests {
    use super::*;

    #[test]
    fn test_fifo_is_rejected() {
        let fx = TestFixture::new();
        let tree = fx.sample_tree();
        let fifo = tree.join("pipe");
        let c_path = std::ffi::CString::new(fifo.to_str().unwrap()).unwrap();
        // SAFETY: c_path is a valid NUL-terminated string.
        assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) }, 0);

        cargo_bin_cmd!("gcp")
            .arg(&tree)
            .arg(fx.dest("copied"))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("error[unsupported_entry_type]"))
            .stderr(predicate::str::contains("FIFO pipe"));
    }

    #[test]
    fn test_copy_to_readonly_directory() {
        use std::os::unix::fs::PermissionsExt;

        // Root ignores permission bits
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let fx = TestFixture::new();
        fs::write(fx.src.path().join("test.txt"), "content").unwrap();
        let readonly = fx.dest("readonly");
        fs::create_dir(&readonly).unwrap();
        fs::set_permissions(&readonly, fs::Permissions::from_mode(0o555)).unwrap();

        cargo_bin_cmd!("gcp")
            .arg(fx.src.path().join("test.txt"))
            .arg(readonly.join("test.txt"))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("error[io_error]"));

        fs::set_permissions(&readonly, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
