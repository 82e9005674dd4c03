//! Machine-readable output tests for gcp CLI.

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::TestFixture;
use serde_json::Value;
use std::fs;

fn parse_stdout(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout should be one JSON document")
}

#[test]
fn test_json_success_record() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();

    let assert = cargo_bin_cmd!("gcp")
        .args(["--output", "json"])
        .arg(&tree)
        .arg(fx.dest("copied"))
        .assert()
        .success();

    let record = parse_stdout(&assert.get_output().stdout);
    assert_eq!(record["schema_version"], "1.0");
    assert_eq!(record["outcome"], "copied");
    assert_eq!(record["stats"]["files_copied"], 2);
    assert_eq!(record["stats"]["dirs_created"], 2);
    assert_eq!(record["stats"]["bytes_copied"], 6);
    assert_eq!(record["stats"]["entries_filtered"], 0);
}

#[test]
fn test_json_failure_record() {
    let fx = TestFixture::new();
    fs::write(fx.src.path().join("a.txt"), "a").unwrap();
    fs::write(fx.dest("a.txt"), "b").unwrap();

    let assert = cargo_bin_cmd!("gcp")
        .args(["--output", "json", "-n", "--error-on-exist"])
        .arg(fx.src.path().join("a.txt"))
        .arg(fx.dest("a.txt"))
        .assert()
        .code(1);

    let record = parse_stdout(&assert.get_output().stdout);
    assert_eq!(record["outcome"], "failed");
    assert_eq!(record["error_code"], "already_exists");
}

#[test]
fn test_json_counts_filtered_entries() {
    let fx = TestFixture::new();
    let tree = fx.sample_tree();

    let assert = cargo_bin_cmd!("gcp")
        .args(["--output", "json", "--exclude", "sub"])
        .arg(&tree)
        .arg(fx.dest("copied"))
        .assert()
        .success();

    let record = parse_stdout(&assert.get_output().stdout);
    assert_eq!(record["stats"]["files_copied"], 1);
    assert_eq!(record["stats"]["entries_filtered"], 1);
}
