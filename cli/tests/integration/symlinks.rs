//! Symlink handling integration tests for gcp CLI.
//!
//! - Default behavior: links are re-created with the same target text
//! - -L/--dereference: link contents are copied as regular files
//! - Replacing a destination link that would clobber its own source fails

#[cfg(unix)]
#[path = "../common/mod.rs"]
mod common;

#[cfg(unix)]
mod unix_tests {
    use crate::common::TestFixture;
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_symlink_preserved_by_default() {
        let fx = TestFixture::new();
        let tree = fx.sample_tree();
        symlink("f1.txt", tree.join("link")).unwrap();

        cargo_bin_cmd!("gcp")
            .arg(&tree)
            .arg(fx.dest("copied"))
            .assert()
            .success()
            .stdout(predicate::str::contains("1 symlinks"));

        let link_path = fx.dest("copied/link");
        let metadata = fs::symlink_metadata(&link_path).unwrap();
        assert!(metadata.file_type().is_symlink(), "Should be a symlink");
        assert_eq!(fs::read_link(&link_path).unwrap().to_str(), Some("f1.txt"));
        fx.assert_file_content(&link_path, "one");
    }

    #[test]
    fn test_dangling_symlink_is_copied() {
        let fx = TestFixture::new();
        let tree = fx.sample_tree();
        symlink("does-not-exist", tree.join("dangling")).unwrap();

        cargo_bin_cmd!("gcp")
            .arg(&tree)
            .arg(fx.dest("copied"))
            .assert()
            .success();

        assert_eq!(
            fs::read_link(fx.dest("copied/dangling")).unwrap().to_str(),
            Some("does-not-exist")
        );
    }

    #[test]
    fn test_dereference_copies_target() {
        let fx = TestFixture::new();
        let tree = fx.sample_tree();
        symlink("f1.txt", tree.join("link")).unwrap();

        cargo_bin_cmd!("gcp")
            .arg("-L")
            .arg(&tree)
            .arg(fx.dest("copied"))
            .assert()
            .success();

        let link_path = fx.dest("copied/link");
        let metadata = fs::symlink_metadata(&link_path).unwrap();
        assert!(metadata.file_type().is_file(), "Should be a regular file");
        fx.assert_file_content(&link_path, "one");
    }

    #[test]
    fn test_top_level_symlink_is_recreated() {
        let fx = TestFixture::new();
        let tree = fx.sample_tree();
        let link = fx.src.path().join("tree-link");
        symlink(&tree, &link).unwrap();

        cargo_bin_cmd!("gcp")
            .arg(&link)
            .arg(fx.dest("link-copy"))
            .assert()
            .success();

        assert_eq!(fs::read_link(fx.dest("link-copy")).unwrap(), tree);
    }

    #[test]
    fn test_link_into_own_target_fails() {
        let fx = TestFixture::new();
        let tree = fx.sample_tree();
        let src_link = fx.src.path().join("to-tree");
        let dest_link = fx.dest("to-sub");
        symlink(&tree, &src_link).unwrap();
        symlink(tree.join("sub"), &dest_link).unwrap();

        cargo_bin_cmd!("gcp")
            .arg(&src_link)
            .arg(&dest_link)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("error[self_copy]"));

        assert_eq!(fs::read_link(&dest_link).unwrap(), tree.join("sub"));
    }

    #[test]
    fn test_link_over_ancestor_of_its_target_fails() {
        let fx = TestFixture::new();
        let tree = fx.sample_tree();
        let src_link = fx.src.path().join("to-sub");
        let dest_link = fx.dest("to-tree");
        symlink(tree.join("sub"), &src_link).unwrap();
        symlink(&tree, &dest_link).unwrap();

        cargo_bin_cmd!("gcp")
            .arg(&src_link)
            .arg(&dest_link)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("error[overwrite_conflict]"));

        assert_eq!(fs::read_link(&dest_link).unwrap(), tree);
    }
}
