//! Integration tests for the `ondus` CLI binary.
//!
//! Argument parsing, help output and error handling run offline; the
//! listing tests point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `ondus` binary with env isolation.
///
/// Clears all `ONDUS_*` env vars and points the config at a nonexistent
/// file so tests never touch the user's real configuration.
fn ondus_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ondus");
    cmd.env("HOME", "/tmp/ondus-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/ondus-cli-test-nonexistent")
        .env("ONDUS_CONFIG", "/tmp/ondus-cli-test-nonexistent/config.toml")
        .env_remove("ONDUS_REFRESH_TOKEN")
        .env_remove("ONDUS_BASE_URL")
        .env_remove("ONDUS_TIMEOUT")
        .env_remove("ONDUS_INSECURE")
        .env_remove("RUST_LOG");
    cmd
}

async fn mock_cloud() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/iot/oidc/refresh"))
        .and(body_json(json!({ "refresh_token": "good-token" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "abc" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/iot/oidc/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/iot/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "locations": [{
                "id": 1,
                "name": "Home",
                "rooms": [{
                    "id": 10,
                    "name": "Kitchen",
                    "appliances": [
                        { "appliance_id": "abc", "type": 104, "name": "Tap" },
                        { "appliance_id": "s1", "type": 101, "name": "Leak sensor" }
                    ]
                }]
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/iot/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "Home" }])))
        .mount(&server)
        .await;

    server
}

fn base_url(server: &MockServer) -> String {
    format!("{}/v3/iot", server.uri())
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = ondus_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    ondus_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("tree")
            .and(predicate::str::contains("appliances"))
            .and(predicate::str::contains("tap")),
    );
}

#[test]
fn test_completions_bash() {
    ondus_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_tap_rejects_out_of_range_amount() {
    ondus_cmd()
        .args(["tap", "--appliance", "abc", "--amount", "0"])
        .assert()
        .code(2);
}

// ── Error handling ──────────────────────────────────────────────────

#[test]
fn test_missing_refresh_token() {
    ondus_cmd()
        .arg("locations")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No refresh token configured"));
}

#[tokio::test]
async fn test_rejected_refresh_token() {
    let server = mock_cloud().await;

    ondus_cmd()
        .args(["--refresh-token", "bad-token", "--base-url", &base_url(&server), "tree"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication failed"));
}

#[tokio::test]
async fn test_unknown_appliance() {
    let server = mock_cloud().await;

    ondus_cmd()
        .args(["--refresh-token", "good-token", "--base-url", &base_url(&server)])
        .args(["tap", "--appliance", "nope", "--amount", "100"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("'nope' not found"));
}

// ── Listings ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tree_renders_hierarchy() {
    let server = mock_cloud().await;

    ondus_cmd()
        .args(["--refresh-token", "good-token", "--base-url", &base_url(&server), "tree"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Home (1)")
                .and(predicate::str::contains("  Kitchen (10)"))
                .and(predicate::str::contains("Tap [BLUE_HOME] abc")),
        );
}

#[tokio::test]
async fn test_locations_json() {
    let server = mock_cloud().await;

    let output = ondus_cmd()
        .args(["--refresh-token", "good-token", "--base-url", &base_url(&server)])
        .args(["-o", "json-compact", "locations"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, json!([{ "id": 1, "name": "Home" }]));
}
