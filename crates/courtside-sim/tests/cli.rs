use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const CONFIG: &str = r#"
run_id: "cli_check"
session:
  seed: 7
  courts: 1
  matches: 12
  generated_players: 6
outputs:
  jsonl: "out/{run_id}/matches.jsonl"
  summary_md: "out/{run_id}/summary.md"
  plots_dir: "out/{run_id}/plots"
"#;

#[test]
fn validate_only_reports_configuration() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("sim.yaml");
    fs::write(&path, CONFIG).expect("write config");

    Command::cargo_bin("courtside-sim")
        .expect("binary built")
        .current_dir(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("--courts")
        .arg("1")
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded configuration 'cli_check' with 6 players on 1 court (12 matches)"))
        .stdout(predicate::str::contains("Validation-only mode"))
        .stdout(predicate::str::contains("courtside 0.1.0 (Court Rotation)"));

    assert!(!dir.path().join("out").exists());
}

#[test]
fn overrides_are_validated() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("sim.yaml");
    fs::write(&path, CONFIG).expect("write config");

    Command::cargo_bin("courtside-sim")
        .expect("binary built")
        .arg("--config")
        .arg(&path)
        .arg("--courts")
        .arg("2")
        .arg("--validate-only")
        .assert()
        .failure()
        .stderr(predicate::str::contains("session.players"));
}

#[test]
fn version_comes_from_engine_metadata() {
    Command::cargo_bin("courtside-sim")
        .expect("binary built")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(courtside_core::AppInfo::version()));
}

#[test]
fn missing_config_fails() {
    Command::cargo_bin("courtside-sim")
        .expect("binary built")
        .arg("--config")
        .arg("does/not/exist.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config"));
}

#[test]
fn full_run_writes_artifacts() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("sim.yaml");
    fs::write(&path, CONFIG).expect("write config");

    Command::cargo_bin("courtside-sim")
        .expect("binary built")
        .current_dir(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("--matches")
        .arg("5")
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulation complete for 'cli_check': 5 matches"));

    let jsonl = fs::read_to_string(dir.path().join("out/cli_check/matches.jsonl")).expect("jsonl");
    assert_eq!(jsonl.lines().count(), 5);
    assert!(dir.path().join("out/cli_check/summary.md").exists());
}
