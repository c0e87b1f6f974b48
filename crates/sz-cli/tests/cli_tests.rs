//! Integration tests for sz-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sz_cmd() -> Command {
    cargo_bin_cmd!("sz")
}

#[test]
fn test_version_flag() {
    sz_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sz"));
}

#[test]
fn test_help_flag() {
    sz_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Snappy"))
        .stdout(predicate::str::contains("--quiet"));
}

#[test]
fn test_no_paths_is_usage_error() {
    sz_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("PATH"));
}

#[test]
fn test_compress_file() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let input = temp.path().join("notes.txt");
    fs::write(&input, "hello hello hello").unwrap();

    sz_cmd()
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("notes.txt.sz"));

    assert!(temp.path().join("notes.txt.sz").exists());
    assert!(input.exists());
}

#[test]
fn test_directory_round_trip() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let dir = temp.path().join("d");
    fs::create_dir_all(dir.join("sub")).unwrap();
    fs::write(dir.join("a.txt"), "hi").unwrap();
    fs::write(dir.join("sub/b.txt"), "there").unwrap();

    sz_cmd()
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("d.tar.sz"));
    assert!(!temp.path().join("d.tar").exists());

    fs::remove_dir_all(&dir).unwrap();
    sz_cmd()
        .arg(temp.path().join("d.tar.sz"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted"));

    assert_eq!(fs::read_to_string(dir.join("a.txt")).unwrap(), "hi");
    assert_eq!(fs::read_to_string(dir.join("sub/b.txt")).unwrap(), "there");
    assert!(!temp.path().join("d.tar").exists());
}

#[test]
fn test_missing_input_reported_but_succeeds() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let good = temp.path().join("good.txt");
    fs::write(&good, "data").unwrap();

    sz_cmd()
        .arg(temp.path().join("missing.txt"))
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::contains("missing.txt"))
        .stdout(predicate::str::contains("good.txt.sz"));

    assert!(temp.path().join("good.txt.sz").exists());
}

#[test]
fn test_quiet_suppresses_output() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let input = temp.path().join("notes.txt");
    fs::write(&input, "quiet please").unwrap();

    sz_cmd()
        .arg("-q")
        .arg(&input)
        .arg(temp.path().join("missing.txt"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(temp.path().join("notes.txt.sz").exists());
}

#[test]
fn test_json_output() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let input = temp.path().join("notes.txt");
    fs::write(&input, "json").unwrap();

    let output = sz_cmd()
        .arg("--json")
        .arg(&input)
        .arg(temp.path().join("missing.txt"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["status"], "success");
    assert_eq!(records[0]["operation"], "compress");
    assert!(
        records[0]["output"]
            .as_str()
            .unwrap()
            .ends_with("notes.txt.sz")
    );
    assert_eq!(records[1]["status"], "error");
    assert!(records[1]["error"].as_str().unwrap().contains("missing.txt"));
}

#[test]
fn test_completions() {
    sz_cmd()
        .arg("--completions")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("sz"));
}
