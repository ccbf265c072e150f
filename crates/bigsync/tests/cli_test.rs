//! Integration tests for the `bigsync` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! exit codes, and config handling — all without requiring a live device.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `bigsync` binary with env isolation.
///
/// Clears all `BIGSYNC_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn bigsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("bigsync");
    cmd.env("HOME", "/tmp/bigsync-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/bigsync-test-nonexistent")
        .env_remove("BIGSYNC_PROFILE")
        .env_remove("BIGSYNC_HOST")
        .env_remove("BIGSYNC_PARTITION")
        .env_remove("BIGSYNC_FORMAT")
        .env_remove("BIGSYNC_JOBS")
        .env_remove("BIGSYNC_INSECURE")
        .env_remove("BIGSYNC_TIMEOUT")
        .env_remove("BIGSYNC_USERNAME")
        .env_remove("BIGSYNC_PASSWORD")
        .env_remove("HTTP_PROXY")
        .env_remove("HTTPS_PROXY")
        .env_remove("ALL_PROXY");
    cmd
}

/// Like [`bigsync_cmd`] but with enough connection detail to get past
/// profile and credential resolution (the host is unreachable).
fn connected_cmd() -> assert_cmd::Command {
    let mut cmd = bigsync_cmd();
    cmd.args(["--host", "https://127.0.0.1:1", "--timeout", "2"])
        .env("BIGSYNC_USERNAME", "admin")
        .env("BIGSYNC_PASSWORD", "secret");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Write a document into a fresh tempdir and return both.
fn write_document(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("services.json");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = bigsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    bigsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("apply")
            .and(predicate::str::contains("diff"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("config"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_version_flag() {
    bigsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bigsync"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    bigsync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    bigsync_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    bigsync_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = bigsync_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_status_without_config_exits_2() {
    bigsync_cmd().arg("status").assert().code(2).stderr(
        predicate::str::contains("profile")
            .or(predicate::str::contains("config"))
            .or(predicate::str::contains("host")),
    );
}

#[test]
fn test_invalid_format_value() {
    let output = bigsync_cmd()
        .args(["--format", "yaml", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("possible values") || text.contains("invalid"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_apply_requires_a_document() {
    let output = bigsync_cmd().arg("apply").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_interval_requires_watch() {
    let (_dir, path) = write_document("{}");
    connected_cmd()
        .args(["apply", "--interval", "5"])
        .arg(&path)
        .assert()
        .code(2);
}

#[test]
fn test_dry_run_conflicts_with_watch() {
    let (_dir, path) = write_document("{}");
    connected_cmd()
        .args(["apply", "--dry-run", "--watch"])
        .arg(&path)
        .assert()
        .code(2);
}

// ── Document exit codes ─────────────────────────────────────────────

#[test]
fn test_apply_missing_document_exits_4() {
    connected_cmd()
        .args(["apply", "/nonexistent/services.json"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("could not read"));
}

#[test]
fn test_apply_malformed_json_exits_4() {
    let (_dir, path) = write_document("{ this is not json");
    connected_cmd()
        .arg("apply")
        .arg(&path)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not valid"));
}

#[test]
fn test_diff_unknown_document_field_exits_4() {
    let (_dir, path) = write_document(r#"{ "virtualServers": [], "bogus": [] }"#);
    connected_cmd()
        .arg("diff")
        .arg(&path)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not valid"));
}

// ── Device unreachable ──────────────────────────────────────────────

#[test]
fn test_status_unreachable_device_exits_1() {
    connected_cmd().arg("status").assert().code(1);
}

#[test]
fn test_diff_unreachable_device_exits_1() {
    let (_dir, path) = write_document("{}");
    connected_cmd().arg("diff").arg(&path).assert().code(1);
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_apply_subcommand_help() {
    bigsync_cmd().args(["apply", "--help"]).assert().success().stdout(
        predicate::str::contains("--watch")
            .and(predicate::str::contains("--dry-run"))
            .and(predicate::str::contains("--interval")),
    );
}

#[test]
fn test_diff_alias_plan() {
    bigsync_cmd()
        .args(["plan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("service document"));
}

#[test]
fn test_config_subcommands_exist() {
    bigsync_cmd().args(["config", "--help"]).assert().success().stdout(
        predicate::str::contains("init")
            .and(predicate::str::contains("show"))
            .and(predicate::str::contains("profiles"))
            .and(predicate::str::contains("set-credentials")),
    );
}

// ── Config handling ─────────────────────────────────────────────────

#[test]
fn test_config_show_without_config_renders_defaults() {
    bigsync_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile"));
}

#[test]
fn test_config_show_json() {
    bigsync_cmd()
        .args(["--format", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"profiles\""));
}

#[test]
fn test_config_profiles_empty_hint() {
    bigsync_cmd()
        .args(["config", "profiles"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No profiles"));
}

#[test]
fn test_config_use_unknown_profile_exits_2() {
    bigsync_cmd()
        .args(["config", "use", "missing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_set_roundtrip() {
    let dir = tempfile::tempdir().unwrap();

    bigsync_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "set", "host", "https://10.0.0.1"])
        .assert()
        .success();

    bigsync_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://10.0.0.1"));

    bigsync_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_set_unknown_key_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    bigsync_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "set", "site", "lab"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_set_validates_auth_scheme() {
    let dir = tempfile::tempdir().unwrap();
    bigsync_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "set", "auth", "kerberos"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("token"));
}
