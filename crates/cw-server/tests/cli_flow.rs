//! End-to-end tests for the `cw` binary: ingest → report → status.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn cw_binary() -> String {
    env!("CARGO_BIN_EXE_cw").to_string()
}

/// Writes a config file pointing at a database inside `temp`, with the broker disabled.
fn write_config(temp: &Path) -> std::path::PathBuf {
    let config_path = temp.join("config.toml");
    let db_path = temp.join("data").join("cw.db");
    std::fs::write(
        &config_path,
        format!(
            "database_path = {db:?}\n\n[mqtt]\nenabled = false\n",
            db = db_path.display().to_string()
        ),
    )
    .unwrap();
    config_path
}

fn cw(temp: &Path, config: &Path, args: &[&str]) -> Output {
    Command::new(cw_binary())
        .env("HOME", temp)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run cw")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_ingest_report_status_flow() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = cw(
        temp.path(),
        &config,
        &[
            "ingest",
            r#"{"wodnjsqkqh_isLightOn":"1","wodnjsqkqh_temperature":"24","wodnjsqkqh_classroom":"A101"}"#,
        ],
    );
    assert_success(&output, "first ingest");
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Recorded light and temperature for A101.\n"
    );

    let output = cw(
        temp.path(),
        &config,
        &[
            "ingest",
            r#"{"isLightOn":"0","temperature":"30","classroom":"A101"}"#,
        ],
    );
    assert_success(&output, "second ingest");

    // The database is created under the configured directory.
    assert!(temp.path().join("data").join("cw.db").exists());

    let output = cw(
        temp.path(),
        &config,
        &["report", "--classroom", "101", "--json"],
    );
    assert_success(&output, "report");
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["classroom"], "101");
    // Both readings arrived within the same minute.
    assert_eq!(report["light"]["total_minutes"], 0);
    assert_eq!(report["temperature"]["total_minutes"], 0);
    assert!(report["date"].is_string());

    let output = cw(temp.path(), &config, &["report", "--classroom", "101"]);
    assert_success(&output, "text report");
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.starts_with("CLASSROOM USAGE: 101"), "unexpected report: {text}");

    let output = cw(temp.path(), &config, &["status"]);
    assert_success(&output, "status");
    let status = String::from_utf8_lossy(&output.stdout);
    assert_eq!(status.matches("- A101: ").count(), 2, "status: {status}");
}

#[test]
fn test_malformed_payload_fails_and_records_nothing() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = cw(temp.path(), &config, &["ingest", "{\"isLightOn\":"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed"));

    let output = cw(temp.path(), &config, &["status"]);
    assert_success(&output, "status");
    let status = String::from_utf8_lossy(&output.stdout);
    assert_eq!(status.matches("No readings recorded.").count(), 2, "status: {status}");
}
