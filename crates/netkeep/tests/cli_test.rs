//! Integration tests for the `netkeep` binary.
//!
//! These validate argument parsing, help output, and error handling --
//! all without requiring a running server.
#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Build a [`Command`] for the `netkeep` binary with env isolation.
fn netkeep_cmd() -> Command {
    let mut cmd = Command::cargo_bin("netkeep").unwrap();
    cmd.env_remove("NETKEEP_SERVER")
        .env_remove("NETKEEP_SITE")
        .env_remove("NETKEEP_OUTPUT");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let output = netkeep_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "expected usage exit code");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "expected 'Usage' in output:\n{text}");
}

#[test]
fn help_flag_lists_commands() {
    netkeep_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("network inventory")
            .and(predicate::str::contains("serve"))
            .and(predicate::str::contains("backup"))
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("subnets")),
    );
}

#[test]
fn version_flag_prints_version() {
    netkeep_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netkeep"));
}

#[test]
fn unknown_subcommand_fails_with_usage() {
    let output = netkeep_cmd().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn backup_import_requires_a_file_argument() {
    let output = netkeep_cmd().args(["backup", "import"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("FILE"));
}

// ── Connection errors ───────────────────────────────────────────────

#[test]
fn devices_list_without_server_reports_connection_failure() {
    let output = netkeep_cmd()
        .args(["devices", "list", "--server", "http://127.0.0.1:1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "connection exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("Could not connect"),
        "expected connection diagnostic:\n{text}"
    );
}

#[test]
fn serve_with_missing_config_file_fails() {
    let output = netkeep_cmd()
        .args(["serve", "--config", "/nonexistent/netkeep.toml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}
