//! Smoke tests for the swipecheck CLI
//!
//! Runs go through the mock backend so no browser or application is needed.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the swipecheck binary
fn swipecheck() -> Command {
    let mut cmd = Command::cargo_bin("swipecheck").expect("swipecheck binary should exist");
    cmd.env_remove("SWIPECHECK_BASE_URL")
        .env_remove("SWIPECHECK_CONFIG")
        .env_remove("SWIPECHECK_JOBS")
        .env_remove("RUST_LOG");
    cmd
}

/// Config with short waits, so mock runs finish quickly
fn fast_config(dir: &TempDir) -> String {
    let path = dir.path().join("swipecheck.yaml");
    fs::write(
        &path,
        r"
timeouts:
  element_ms: 300
  action_ms: 300
  probe_ms: 30
  poll_interval_ms: 5
jobs: 4
",
    )
    .expect("write config");
    path.to_str().unwrap().to_string()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    swipecheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    swipecheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    swipecheck().assert().failure();
}

#[test]
fn test_run_help_mentions_backend() {
    swipecheck()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--backend"))
        .stdout(predicate::str::contains("--report"));
}

// ============================================================================
// List
// ============================================================================

#[test]
fn test_list_all() {
    swipecheck()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth::login_screen_on_load"))
        .stdout(predicate::str::contains("ui::back_navigation"));
}

#[test]
fn test_list_json_filtered() {
    let output = swipecheck()
        .args(["list", "messaging", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let entries: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.len(), 8);
}

#[test]
fn test_list_unknown_filter_exits_2() {
    swipecheck()
        .args(["list", "astrology"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no scenario matches"));
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn test_mock_run_passes() {
    let dir = TempDir::new().unwrap();
    swipecheck()
        .args(["run", "swipe", "--backend", "mock", "--config"])
        .arg(fast_config(&dir))
        .assert()
        .success()
        .stderr(predicate::str::contains("PASSED 7 scenarios"));
}

#[test]
fn test_mock_run_writes_report() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("report.json");
    swipecheck()
        .args(["run", "auth", "--backend", "mock", "--suffix", "smoke1234"])
        .args(["--config", &fast_config(&dir)])
        .arg("--report")
        .arg(&report)
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["backend"], "mock");
    assert!(json["started_at"].is_string());
    assert_eq!(json["results"].as_array().unwrap().len(), 5);
}

#[test]
fn test_zero_run_budget_exits_1() {
    let dir = TempDir::new().unwrap();
    swipecheck()
        .args(["run", "ui::branding", "--backend", "mock", "--run-timeout", "0"])
        .args(["--config", &fast_config(&dir)])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timed out"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_default() {
    swipecheck()
        .args(["config", "--default"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url: http://localhost:3001"));
}

#[test]
fn test_config_output_loads_back() {
    let output = swipecheck()
        .args(["config", "--base-url", "http://staging.example:8080"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let yaml = String::from_utf8(output.stdout).unwrap();
    let config = swipecheck::HarnessConfig::from_yaml(&yaml).unwrap();
    assert_eq!(config.base_url, "http://staging.example:8080");
}

#[test]
fn test_config_env_base_url() {
    swipecheck()
        .arg("config")
        .env("SWIPECHECK_BASE_URL", "http://staging.example:8080")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://staging.example:8080"));
}

#[test]
fn test_config_invalid_file_exits_2() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "timeouts: [not, a, map]").unwrap();
    swipecheck()
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .code(2);
}
