use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const CATALOG: &str = r#"{
  "config": { "step_separator": ";" },
  "types": ["stat"],
  "names": [
    { "type": "stat", "name": "hp", "init": 100, "min": 0, "max": 100, "cycle": "permanent" },
    { "type": "stat", "name": "dmg" }
  ]
}"#;

fn write_catalog(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("catalog.json");
    fs::write(&path, CATALOG).unwrap();
    path
}

#[test]
fn test_cli_names_lists_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = write_catalog(&temp_dir);

    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("--catalog").arg(&catalog).arg("names");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hp"))
        .stdout(predicate::str::contains("permanent"))
        .stdout(predicate::str::contains("dmg"))
        .stdout(predicate::str::contains("stat"));
}

#[test]
fn test_cli_names_requires_catalog() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("names");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--catalog"));
}

#[test]
fn test_cli_catalog_bounds_and_separator() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = write_catalog(&temp_dir);

    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("run")
        .arg("hp -= dmg; hp -= dmg")
        .arg("--catalog")
        .arg(&catalog)
        .arg("hp=30")
        .arg("dmg=20")
        .arg("--raw");

    cmd.assert().success().stdout("0\n");
}

#[test]
fn test_cli_invalid_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, "{ \"names\": 3 }").unwrap();

    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("eval").arg("1").arg("--catalog").arg(&path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid catalog JSON"));
}
