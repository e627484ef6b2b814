//! Integration tests for the bindcli demo binary
//!
//! These tests run the actual binary and verify standard output, exit codes
//! and the files written through the JSON dataset store.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Binary isolated from any user settings file
fn bindcli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bindcli").unwrap();
    cmd.current_dir(dir.path())
        .env("BINDCLI_CONFIG", dir.path().join("no-config.toml"))
        .env_remove("RUST_LOG");
    cmd
}

fn write_json(path: &Path, value: Value) {
    fs::write(path, serde_json::to_string(&value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// Token arguments
// ============================================================================

#[test]
fn test_sum_arguments() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .args(["sum", "1", "2", "3"])
        .assert()
        .success()
        .stdout("6.0\n");
}

#[test]
fn test_sum_flag_from_default() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .args(["sum", "-s", "10", "1", "-2"])
        .assert()
        .success()
        .stdout("9.0\n");
}

#[test]
fn test_sum_info() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .args(["sum", "--info"])
        .assert()
        .success()
        .stdout("sum inf>0 dep once\n");
}

#[test]
fn test_sum_help_lists_run_options() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .args(["sum", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sum [options] [VALUES_1"))
        .stdout(predicate::str::contains("--overwrite"))
        .stdout(predicate::str::contains("--start"));
}

#[test]
fn test_command_log() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir).args(["sum", "-C", "1", "2"]).assert().success();
    let logged = fs::read_to_string(dir.path().join("sum.cmd")).unwrap();
    assert_eq!(logged, "sum -C 1 2\n");
}

// ============================================================================
// Standard streams
// ============================================================================

#[test]
fn test_mean_reads_all_lines() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .arg("mean")
        .write_stdin("1\n2\n3\n")
        .assert()
        .success()
        .stdout("2.0 3\n");
}

#[test]
fn test_mean_rejects_arguments() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .args(["mean", "extra"])
        .write_stdin("1\n")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("BIND-020"));
}

#[test]
fn test_paste_runs_line_by_line() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .args(["paste", "-g", "+"])
        .write_stdin("a b c\nd e\n")
        .assert()
        .success()
        .stdout("a+b+c\nd+e\n");
}

#[test]
fn test_paste_timings_report() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .args(["paste", "-T"])
        .write_stdin("x y\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("xy\ntotal: "))
        .stdout(predicate::str::contains("call"));
}

// ============================================================================
// Dataset files
// ============================================================================

#[test]
fn test_scale_pairs_files() {
    let dir = TempDir::new().unwrap();
    let (a, b) = (dir.path().join("a.json"), dir.path().join("b.json"));
    let (x, y) = (dir.path().join("x.json"), dir.path().join("y.json"));
    write_json(&a, json!({"data": [1, 2]}));
    write_json(&b, json!({"data": [5]}));

    bindcli(&dir)
        .args(["scale", "-O", "-f", "3"])
        .args([&a, &b, &x, &y])
        .assert()
        .success()
        .stdout("");

    let out = read_json(&x);
    assert_eq!(out["data"], json!([3.0, 6.0]));
    assert!(out["created"].is_string());
    assert_eq!(read_json(&y)["data"], json!([15.0]));
}

#[test]
fn test_scale_missing_input_file() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .args(["scale", "nope.json", "out.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("BIND-031"))
        .stderr(predicate::str::contains("nope.json"));
}

#[test]
fn test_scale_odd_argument_count() {
    let dir = TempDir::new().unwrap();
    bindcli(&dir)
        .args(["scale", "a.json", "b.json", "c.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("even number"));
}

#[test]
fn test_scale_must_exist_skips() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.json");
    write_json(&input, json!({"data": [1]}));
    let output = dir.path().join("missing.json");

    bindcli(&dir)
        .args(["scale", "-E"])
        .args([&input, &output])
        .assert()
        .success();
    assert!(!output.exists());
}

#[test]
fn test_scale_never_overwrite() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.json");
    let output = dir.path().join("out.json");
    write_json(&input, json!({"data": [1]}));
    write_json(&output, json!({"data": [0]}));

    bindcli(&dir)
        .args(["scale", "--no-overwrite"])
        .args([&input, &output])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BIND-032"));
    assert_eq!(read_json(&output)["data"], json!([0]));
}

#[test]
fn test_settings_file_layer() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "outsep = \",\"\n").unwrap();

    bindcli(&dir)
        .env("BINDCLI_CONFIG", &config)
        .arg("mean")
        .write_stdin("4\n6\n")
        .assert()
        .success()
        .stdout("5.0,2\n");
}
