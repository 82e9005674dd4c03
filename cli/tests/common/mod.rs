//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test fixture that provides source and destination directories.
pub struct TestFixture {
    pub src: TempDir,
    pub dst: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with fresh source and destination directories.
    pub fn new() -> Self {
        Self {
            src: TempDir::new().expect("Failed to create temp source dir"),
            dst: TempDir::new().expect("Failed to create temp dest dir"),
        }
    }

    /// Build `tree/{f1.txt, sub/f2.txt}` under the source dir and return its path.
    pub fn sample_tree(&self) -> PathBuf {
        let tree = self.src.path().join("tree");
        fs::create_dir_all(tree.join("sub")).expect("Failed to create directory");
        fs::write(tree.join("f1.txt"), "one").expect("Failed to write file");
        fs::write(tree.join("sub/f2.txt"), "two").expect("Failed to write file");
        tree
    }

    /// Path below the destination dir.
    pub fn dest(&self, rel: &str) -> PathBuf {
        self.dst.path().join(rel)
    }

    /// Count all non-directory entries recursively.
    pub fn count_files_recursive(&self, dir: &Path) -> usize {
        let mut count = 0;
        if dir.is_dir() {
            for entry in fs::read_dir(dir).expect("Failed to read directory") {
                let path = entry.expect("Failed to read entry").path();
                if path.is_dir() && !path.is_symlink() {
                    count += self.count_files_recursive(&path);
                } else {
                    count += 1;
                }
            }
        }
        count
    }

    /// Check if a file exists and has the expected content.
    pub fn assert_file_content(&self, path: &Path, expected: &str) {
        assert!(path.exists(), "File does not exist: {:?}", path);
        let actual = fs::read_to_string(path).expect("Failed to read file");
        assert_eq!(actual, expected, "File content mismatch");
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Permission bits of `path` (without following a final symlink).
#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::symlink_metadata(path)
        .expect("Failed to stat")
        .permissions()
        .mode()
        & 0o7777
}
