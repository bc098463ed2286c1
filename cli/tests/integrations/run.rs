use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_cli_run_operations() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("run").arg("gold += 10 exp *= 2").arg("gold=5").arg("exp=3");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("gold"))
        .stdout(predicate::str::contains("15"))
        .stdout(predicate::str::contains("exp"))
        .stdout(predicate::str::contains("6"));
}

#[test]
fn test_cli_run_operations_raw_prints_last_target() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("run").arg("a = 2 b = a * 10").arg("a=0").arg("b=0").arg("--raw");

    cmd.assert().success().stdout("20\n");
}

#[test]
fn test_cli_run_process_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hit.numen");
    fs::write(
        &path,
        r#"
// one round of combat
dmg = Max(atk - def, 0)
hp -= dmg
Return(hp <= 0, 0)
Return(hp)
"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("run")
        .arg("--process")
        .arg("--file")
        .arg(&path)
        .arg("hp=50")
        .arg("atk=12")
        .arg("def=4")
        .arg("dmg=0");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("return = 42"))
        .stdout(predicate::str::contains("dmg"))
        .stdout(predicate::str::contains("8"));
}

#[test]
fn test_cli_run_process_raw() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("run")
        .arg("Return(hp <= 0, 7) Return(hp * 2)")
        .arg("--process")
        .arg("--raw")
        .arg("hp=0");

    cmd.assert().success().stdout("7\n");
}

#[test]
fn test_cli_run_missing_source() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("run");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("nothing to run"));
}

#[test]
fn test_cli_run_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("run").arg("--file").arg(temp_dir.path().join("absent.numen"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_cli_run_process_statement_error() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("run").arg("x + 1").arg("--process").arg("x=1");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("operator '+' must be followed by '='"));
}
