//! CLI integration tests.
//!
//! Tests:
//! - Help output lists the expected options
//! - Set then get persists across separate processes
//! - Opening a database in a missing directory fails cleanly

mod common;

use common::TestFixture;
use std::process::{Command, Output};

fn nsettings(fixture: &TestFixture, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nsettings"))
        .arg("--database")
        .arg(&fixture.db_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run nsettings")
}

#[test]
fn test_cli_help_output() {
    let output = Command::new(env!("CARGO_BIN_EXE_nsettings"))
        .arg("--help")
        .output()
        .expect("failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--database"), "help should mention --database");
    assert!(stdout.contains("--log-level"), "help should mention --log-level");
    assert!(stdout.contains("set"), "help should list the set command");
}

#[test]
fn test_cli_version_output() {
    let output = Command::new(env!("CARGO_BIN_EXE_nsettings"))
        .arg("--version")
        .output()
        .expect("failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1.0"), "unexpected version output: {stdout}");
}

#[test]
fn test_cli_set_then_get() {
    let fixture = TestFixture::new();

    let set = nsettings(&fixture, &["set", "alpha", "theme", "dark"]);
    assert!(
        set.status.success(),
        "set failed: {}",
        String::from_utf8_lossy(&set.stderr)
    );

    let get = nsettings(&fixture, &["get", "alpha", "theme"]);
    assert!(get.status.success());
    let value: serde_json::Value = serde_json::from_slice(&get.stdout).unwrap();
    assert_eq!(value, serde_json::json!("dark"));

    let list = nsettings(&fixture, &["list"]);
    let listed: serde_json::Value = serde_json::from_slice(&list.stdout).unwrap();
    assert_eq!(listed, serde_json::json!([{"namespace": "alpha", "keys": 1}]));
}

#[test]
fn test_cli_get_missing_namespace_fails() {
    let fixture = TestFixture::new();
    let output = nsettings(&fixture, &["get", "ghost"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_reports_open_failure() {
    let fixture = TestFixture::new();
    let output = Command::new(env!("CARGO_BIN_EXE_nsettings"))
        .arg("--database")
        .arg(fixture.temp_dir.path().join("missing").join("s.sqlite3"))
        .arg("list")
        .output()
        .expect("failed to run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open settings database"), "stderr: {stderr}");
}
