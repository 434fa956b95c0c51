//! Integration tests for the `dahua` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a device; `check` runs against a wiremock stand-in.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `dahua` binary with env isolation.
///
/// Clears all `DAHUA_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn dahua_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("dahua");
    cmd.env("HOME", "/tmp/dahua-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/dahua-cli-test-nonexistent")
        .env_remove("DAHUA_PROFILE")
        .env_remove("DAHUA_ADDRESS")
        .env_remove("DAHUA_USERNAME")
        .env_remove("DAHUA_PASSWORD")
        .env_remove("DAHUA_OUTPUT")
        .env_remove("DAHUA_INSECURE")
        .env_remove("DAHUA_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mock_identity(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cgi-bin/configManager.cgi"))
        .and(query_param("action", "getConfig"))
        .and(query_param("name", "General"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("table.General.LocalNo=8\r\ntable.General.MachineName=Porch\r\n"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/magicBox.cgi"))
        .and(query_param("action", "getSystemInfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("deviceType=IPC-HDW5831R-ZE\r\nserialNumber=4X01234PAZ\r\n"),
        )
        .mount(server)
        .await;
}

/// Run the blocking binary off the runtime that serves the mock.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let mut cmd = dahua_cmd();
    cmd.args(["--address", &server.uri(), "--username", "admin"])
        .env("DAHUA_PASSWORD", "hunter2")
        .args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = dahua_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    dahua_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Dahua")
            .and(predicate::str::contains("check"))
            .and(predicate::str::contains("snapshot"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("infrared")),
    );
}

#[test]
fn test_version_flag() {
    dahua_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dahua"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    dahua_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    dahua_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = dahua_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_info_without_device() {
    dahua_cmd()
        .arg("info")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No device configured"));
}

#[test]
fn test_address_without_password() {
    dahua_cmd()
        .args(["--address", "10.0.0.5", "--username", "admin", "info"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No credentials"));
}

#[test]
fn test_unknown_profile() {
    dahua_cmd()
        .args(["--profile", "garage", "info"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("garage"));
}

#[test]
fn test_infrared_brightness_out_of_range() {
    let output = dahua_cmd()
        .args(["infrared", "on", "--brightness", "150"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("150"), "Expected range error:\n{text}");
}

#[test]
fn test_invalid_output_format() {
    let output = dahua_cmd()
        .args(["--output", "invalid", "info"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path() {
    dahua_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_no_config() {
    dahua_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile"));
}

#[test]
fn test_config_subcommands_exist() {
    dahua_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("path")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("profiles")),
        );
}

// ── Against a device ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_check_reports_identity() {
    let server = MockServer::start().await;
    mock_identity(&server).await;

    let output = run_against(&server, &["--output", "json", "check"]).await;
    let text = combined_output(&output);
    assert!(output.status.success(), "check failed:\n{text}");

    let identity: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(identity["machine_name"], "Porch");
    assert_eq!(identity["serial_number"], "4X01234PAZ");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let output = run_against(&server, &["check"]).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Authentication failed"));
}

#[test]
fn test_config_profiles_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("dahua");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        r#"
default_profile = "porch"

[profiles.porch]
address = "192.168.1.108"
username = "admin"
password = "hunter2"

[profiles.garage]
address = "192.168.1.109"
username = "admin"
"#,
    )
    .unwrap();

    dahua_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["--output", "plain", "config", "profiles"])
        .assert()
        .success()
        .stdout("garage\nporch\n");

    dahua_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("192.168.1.108")
                .and(predicate::str::contains("hunter2").not()),
        );
}
