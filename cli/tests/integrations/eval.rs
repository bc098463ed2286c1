use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_eval_with_seeded_values() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("eval").arg("atk*2 - Min(def, 10)").arg("atk=12").arg("def=4");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("((atk*2)-Min(def,10)) = 20"))
        .stdout(predicate::str::contains("((12*2)-Min(4,10))"));
}

#[test]
fn test_cli_eval_raw() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("eval").arg("Sqrt(x) + 1").arg("x=16").arg("--raw");

    cmd.assert().success().stdout("5\n");
}

#[test]
fn test_cli_eval_parse_error() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("eval").arg("(1 + 2");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing right parenthesis"));
}

#[test]
fn test_cli_eval_unknown_name() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("eval").arg("ghost + 1");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown name 'ghost'"));
}

#[test]
fn test_cli_eval_rejects_malformed_value() {
    let mut cmd = Command::cargo_bin("numen").unwrap();
    cmd.arg("eval").arg("x").arg("x=abc");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid number in 'x=abc'"));
}

#[test]
fn test_cli_check_exit_codes() {
    let mut holds = Command::cargo_bin("numen").unwrap();
    holds
        .arg("check")
        .arg("hp <= 0 || mp > 10")
        .arg("hp=5")
        .arg("mp=20")
        .arg("--raw");
    holds.assert().success().stdout("true\n");

    let mut fails = Command::cargo_bin("numen").unwrap();
    fails.arg("check").arg("hp <= 0").arg("hp=5").arg("--raw");
    fails.assert().code(2).stdout("false\n");
}
