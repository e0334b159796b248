//! Command-line surface tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn flashback(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("flashback").unwrap();
    cmd.env("FLASHBACK_CONFIG", config_dir.path().join("config.toml"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn config_show_prints_defaults() {
    let dir = TempDir::new().unwrap();
    flashback(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[buffer]"))
        .stdout(predicate::str::contains("max_duration = 30.0"));
}

#[test]
fn config_migrate_creates_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    flashback(&dir)
        .args(["config", "migrate", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("[navigation]"));
    assert!(content.contains("[replay]"));
}

#[test]
fn config_migrate_leaves_complete_file_alone() {
    let dir = TempDir::new().unwrap();
    flashback(&dir).args(["config", "migrate", "--yes"]).assert().success();

    flashback(&dir)
        .args(["config", "migrate", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date"));
}

#[test]
fn simulate_prints_a_report() {
    let dir = TempDir::new().unwrap();
    flashback(&dir)
        .args(["simulate", "--seconds", "20", "--seek-back", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("State:"))
        .stdout(predicate::str::contains("Buffered:"))
        .stdout(predicate::str::contains("Sessions:"));
}

#[test]
fn simulate_rejects_zero_length_fragments() {
    let dir = TempDir::new().unwrap();
    flashback(&dir)
        .args(["simulate", "--fragment", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Fragment length"));
}

#[test]
fn completions_are_generated() {
    let dir = TempDir::new().unwrap();
    flashback(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flashback"));
}
