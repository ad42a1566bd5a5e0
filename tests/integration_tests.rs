use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const SESSION: &str = r"
variables:
  poly: { type: polygon, value: [[0, 0], [10, 0], [10, 5], [0, 5]] }
  pt: { type: point, value: [2, 3] }
  count: { type: int, value: 7 }
";

/// Scratch directory holding a session file; logs land here too.
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("session.yaml"), SESSION).unwrap();
    dir
}

fn cmd(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("geowatch");
    cmd.current_dir(dir)
        .arg("--log-file")
        .arg(dir.join("geowatch.log"));
    cmd
}

#[test]
fn test_cli_prints_table_report() {
    let dir = workspace();
    cmd(dir.path())
        .args(["-s", "session.yaml", "-w", "poly", "-w", "pt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EXPRESSION"))
        .stdout(predicate::str::contains("polygon"))
        .stdout(predicate::str::contains("image: 800x400"))
        .stdout(predicate::str::contains("view: full"));
}

#[test]
fn test_cli_empty_watch_list_shows_placeholder() {
    let dir = workspace();
    cmd(dir.path())
        .args(["-s", "session.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(placeholder)"));
}

#[test]
fn test_cli_json_report() {
    let dir = workspace();
    let output = cmd(dir.path())
        .args(["-s", "session.yaml", "-w", "pt", "-w", "nope", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["type"], "point");
    assert_eq!(rows[0]["color_id"], 0);
    assert!(rows[1]["type"].is_null());
    assert_eq!(json["copy_enabled"], true);
    assert_eq!(json["zoomed"], false);
}

#[test]
fn test_cli_non_geometric_value_is_reported() {
    let dir = workspace();
    cmd(dir.path())
        .args(["-s", "session.yaml", "-w", "poly", "-w", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not drawn: count"));
}

#[test]
fn test_cli_zoom_and_drag() {
    let dir = workspace();
    cmd(dir.path())
        .args([
            "-s",
            "session.yaml",
            "-w",
            "poly",
            "--zoom",
            "0,0,400,200",
            "--drag",
            "100,100,500,150",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("view: zoomed"));
}

#[test]
fn test_cli_writes_ppm_image() {
    let dir = workspace();
    cmd(dir.path())
        .args([
            "-s",
            "session.yaml",
            "-w",
            "poly",
            "--width",
            "64",
            "--height",
            "32",
            "-o",
            "out.ppm",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote image"));

    let bytes = fs::read(dir.path().join("out.ppm")).unwrap();
    assert!(bytes.starts_with(b"P6"));
}

#[test]
fn test_cli_missing_session_fails() {
    let dir = workspace();
    cmd(dir.path())
        .args(["-s", "absent.yaml", "-w", "poly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load session"));
}

#[test]
fn test_cli_rejects_malformed_zoom() {
    let dir = workspace();
    cmd(dir.path())
        .args(["--zoom", "1,2,3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 4 comma-separated numbers"));
}

#[test]
fn test_cli_save_config() {
    let dir = workspace();
    cmd(dir.path())
        .args(["--theme", "light", "--width", "320", "--save-config", "saved.toml"])
        .assert()
        .success();

    let saved = fs::read_to_string(dir.path().join("saved.toml")).unwrap();
    assert!(saved.contains("light"));
    assert!(saved.contains("320"));

    // The saved file drives the next run
    cmd(dir.path())
        .args(["--config", "saved.toml", "-s", "session.yaml", "-w", "poly"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image: 320x400"));
}

#[test]
fn test_cli_completions() {
    let dir = workspace();
    cmd(dir.path())
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("geowatch"));
}
