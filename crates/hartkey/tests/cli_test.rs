//! Integration tests for the `hartkey` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling, all without talking to the Hartkey cloud.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `hartkey` binary with env isolation.
///
/// Clears all `HARTKEY_*` env vars and points config directories at a
/// temporary path so tests never touch the user's real configuration.
fn hartkey_cmd(home: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hartkey");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("HARTKEY_TOKEN")
        .env_remove("HARTKEY_OUTPUT")
        .env_remove("HARTKEY_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = hartkey_cmd(&home).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home).arg("--help").assert().success().stdout(
        predicate::str::contains("intercoms")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("events"))
            .and(predicate::str::contains("open"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("entities")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hartkey"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = hartkey_cmd(&home).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let home = tempfile::tempdir().unwrap();
    let output = hartkey_cmd(&home)
        .args(["--output", "invalid", "devices"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_events_limit_out_of_range() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .args(["--token", "t", "events", "front", "--limit", "500"])
        .assert()
        .code(2);
}

#[test]
fn test_devices_without_token() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .arg("devices")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No token configured"));
}

#[test]
fn test_open_requires_device() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home).arg("open").assert().code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // `config show` renders defaults when no config file exists.
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("interval_minutes = 5"));
}

#[test]
fn test_config_show_json() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .args(["--output", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"interval_minutes\": 5"));
}

#[test]
fn test_config_path_prints_toml_file() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_set_interval_rejects_zero() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .args(["config", "set-interval", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("interval"));
}

#[test]
fn test_config_set_token_rejects_empty_stdin() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .args(["config", "set-token"])
        .write_stdin("\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("token"));
}

#[test]
fn test_config_subcommands_exist() {
    let home = tempfile::tempdir().unwrap();
    hartkey_cmd(&home)
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("path")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("set-token"))
                .and(predicate::str::contains("set-interval")),
        );
}
