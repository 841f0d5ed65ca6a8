//! CLI binary tests.
//!
//! These run the compiled `securekv` binary against a file vault in a
//! temporary directory.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const MASTER_KEY: &str = "0101010101010101010101010101010101010101010101010101010101010101";

fn securekv(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_securekv"));
    cmd.env("SECUREKV_CONFIG", dir.join("securekv.json5"))
        .env("SECUREKV_MASTER_KEY", MASTER_KEY)
        .env_remove("SECUREKV_BACKEND")
        .env_remove("RUST_LOG")
        .arg("--backend")
        .arg("file")
        .arg("--path")
        .arg(dir.join("vault.json"));
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    securekv(dir)
        .args(args)
        .output()
        .expect("failed to run securekv")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["version"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("securekv "));
}

#[test]
fn test_token_scenario() {
    let dir = TempDir::new().unwrap();
    let dir = dir.path();

    let written = run(
        dir,
        &["write", "token", "--value", "abc123", "--accessibility", "first_unlock"],
    );
    assert!(written.status.success(), "{written:?}");

    assert_eq!(stdout(&run(dir, &["contains", "token"])), "true");
    assert_eq!(stdout(&run(dir, &["read", "token"])), "abc123");

    assert!(run(dir, &["delete", "token"]).status.success());
    let gone = run(dir, &["read", "token"]);
    assert!(gone.status.success());
    assert_eq!(stdout(&gone), "");
    assert_eq!(stdout(&run(dir, &["contains", "token"])), "false");
}

#[test]
fn test_read_all_and_delete_all() {
    let dir = TempDir::new().unwrap();
    let dir = dir.path();
    run(dir, &["write", "a", "--value", "1"]);
    run(dir, &["write", "b", "--value", "ü"]);

    let listed = run(dir, &["read-all"]);
    let entries: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    assert_eq!(entries, serde_json::json!({"a": "1", "b": "ü"}));

    assert!(run(dir, &["delete-all"]).status.success());
    let listed = run(dir, &["read-all"]);
    let entries: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    assert_eq!(entries, serde_json::json!({}));
}

#[test]
fn test_synchronizable_access_control_fails() {
    let dir = TempDir::new().unwrap();
    let output = run(
        dir.path(),
        &[
            "write",
            "k",
            "--value",
            "v",
            "--synchronizable",
            "--access-control",
            "biometry_any",
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("-50"), "stderr: {stderr}");
}

#[test]
fn test_raw_call() {
    let dir = TempDir::new().unwrap();
    let dir = dir.path();

    let written = run(dir, &["call", "write", r#"{"key": "k", "value": "v", "accountName": "svc"}"#]);
    assert!(written.status.success());

    let read = run(dir, &["call", "read", r#"{"key": "k", "accountName": "svc"}"#]);
    let response: serde_json::Value = serde_json::from_slice(&read.stdout).unwrap();
    assert_eq!(response, serde_json::json!({"status": 0, "value": "v"}));

    let unknown = run(dir, &["call", "update", "{}"]);
    assert!(!unknown.status.success());
    let response: serde_json::Value = serde_json::from_slice(&unknown.stdout).unwrap();
    assert_eq!(response["status"], -50);
}

#[test]
fn test_account_scope_flag() {
    let dir = TempDir::new().unwrap();
    let dir = dir.path();
    run(dir, &["--account", "team", "write", "k", "--value", "v"]);

    assert_eq!(stdout(&run(dir, &["--account", "team", "read", "k"])), "v");
    assert_eq!(stdout(&run(dir, &["--account", "other", "read", "k"])), "");
}

#[test]
fn test_config_validate_reports_problems() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("securekv.json5"),
        "{ defaults: { synchronizable: true, access_control: 'user_presence' } }",
    )
    .unwrap();

    let output = run(dir.path(), &["config", "validate"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("synchronizable"), "stderr: {stderr}");
}
