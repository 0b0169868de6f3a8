//! Integration tests for the `courtside` CLI binary.
//!
//! Argument parsing, config handling and error exit codes run without a
//! backend; the inbox commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `courtside` binary with env isolation.
///
/// Clears all `COURTSIDE_*` env vars and points the config file at
/// `config` so tests never touch the user's real configuration.
fn courtside_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("courtside");
    cmd.env("HOME", "/tmp/courtside-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/courtside-cli-test-nonexistent")
        .env("COURTSIDE_CONFIG", config)
        .env_remove("COURTSIDE_PROFILE")
        .env_remove("COURTSIDE_SERVER")
        .env_remove("COURTSIDE_TOKEN")
        .env_remove("COURTSIDE_OUTPUT")
        .env_remove("COURTSIDE_INSECURE")
        .env_remove("COURTSIDE_TIMEOUT")
        .env_remove("COURTSIDE_USER_ID");
    cmd
}

fn scratch() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    (dir, config)
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, config) = scratch();
    let output = courtside_cmd(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let (_dir, config) = scratch();
    courtside_cmd(&config).arg("--help").assert().success().stdout(
        predicate::str::contains("watch")
            .and(predicate::str::contains("notifications"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("courtside"));
}

#[test]
fn test_completions_zsh() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_output_format() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["--output", "invalid", "notifications", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(config.to_str().unwrap()));
}

#[test]
fn test_config_show_without_file() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_init_writes_profile() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args([
            "--profile",
            "local",
            "--server",
            "http://localhost:9000",
            "--user",
            "u1",
            "config",
            "init",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved profile 'local'"));

    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("default_profile = \"local\""));
    assert!(written.contains("server = \"http://localhost:9000\""));
    assert!(written.contains("user_id = \"u1\""));

    courtside_cmd(&config)
        .args(["--profile", "local", "--user", "u2", "config", "init"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_init_requires_user() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["config", "init"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No user configured"));
    assert!(!config.exists());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_notifications_without_backend() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["notifications", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No backend configured"));
}

#[test]
fn test_broken_config_file_is_reported() {
    let (_dir, config) = scratch();
    std::fs::write(&config, "[profiles.home\nserver = ").unwrap();
    let output = courtside_cmd(&config)
        .args(["notifications", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(!combined_output(&output).contains("No backend configured"));
}

#[test]
fn test_unknown_profile_is_not_found() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["--profile", "staging", "notifications", "unread"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("staging"));
}

#[test]
fn test_clear_requires_confirmation() {
    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args([
            "--server",
            "http://127.0.0.1:9",
            "--user",
            "u1",
            "notifications",
            "clear",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires confirmation"));
}

// ── Inbox against a mock backend ────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_renders_stored_notifications() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "n1",
                "user_id": "u1",
                "title": "Player Milestone",
                "message": "Jokic reached 30+ points (31)",
                "type": "alert",
                "read": false,
                "created_at": "2024-03-01T12:00:00Z"
            }],
            "count": 1,
            "total": 1,
            "has_more": false
        })))
        .mount(&server)
        .await;

    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["--server", &server.uri(), "--user", "u1", "-o", "json"])
        .args(["notifications", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Player Milestone")
                .and(predicate::str::contains("\"type\": \"alert\"")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_plain_prints_id_state_and_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "id": "n2",
                    "user_id": "u1",
                    "title": "Game Started",
                    "message": "NYK @ BOS is underway",
                    "type": "update",
                    "read": false,
                    "created_at": "2024-03-01T19:00:00Z"
                },
                {
                    "id": "n1",
                    "user_id": "u1",
                    "title": "Feed delayed",
                    "message": "Scores may lag",
                    "type": "system",
                    "read": true,
                    "created_at": "2024-03-01T18:00:00Z"
                }
            ],
            "count": 2,
            "total": 2,
            "has_more": false
        })))
        .mount(&server)
        .await;

    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["--server", &server.uri(), "--user", "u1", "-o", "plain"])
        .args(["notifications", "list"])
        .assert()
        .success()
        .stdout("n2\tunread\tGame Started\nn1\tread\tFeed delayed\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unread_plain_prints_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/notifications/unread-count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 4 })))
        .mount(&server)
        .await;

    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["--server", &server.uri(), "--user", "u1", "-o", "plain"])
        .args(["notifications", "unread"])
        .assert()
        .success()
        .stdout("4\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_missing_notification_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/notifications/missing/read"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such notification"))
        .mount(&server)
        .await;

    let (_dir, config) = scratch();
    courtside_cmd(&config)
        .args(["--server", &server.uri(), "--user", "u1"])
        .args(["notifications", "read", "missing"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("notification 'missing' not found"));
}
