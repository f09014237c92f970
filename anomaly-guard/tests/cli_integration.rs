//! Runs the `anomaly-scan` binary end to end: exit codes and `--explain` selection.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

const DATA: &str = "name,email\n\"\",ann@example.com\nbob,broken\n";

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn anomaly_scan() -> Command {
    Command::cargo_bin("anomaly-scan").unwrap()
}

#[test]
fn test_scan_succeeds_and_numbers_from_one() {
    let file = csv_file(DATA);
    anomaly_scan()
        .arg(file.path())
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 Missing Values in 'name'"))
        .stdout(predicate::str::contains("#2 Format Violation in 'email'"));
}

#[test]
fn test_clean_data_exits_zero_with_empty_json() {
    let file = csv_file("name,score\na,5\nb,5\n");
    anomaly_scan()
        .arg(file.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn test_explain_uses_displayed_number() {
    let file = csv_file(DATA);
    anomaly_scan()
        .arg(file.path())
        .args(["--explain", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Column: email"))
        .stdout(predicate::str::contains("- Anomaly Type: Format Violation"));

    anomaly_scan()
        .arg(file.path())
        .args(["--explain", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Column: name"));
}

#[test]
fn test_explain_out_of_range_exits_one() {
    let file = csv_file(DATA);
    anomaly_scan()
        .arg(file.path())
        .args(["--explain", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("numbered from 1"));
}

#[test]
fn test_missing_file_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    anomaly_scan()
        .arg(dir.path().join("absent.csv"))
        .assert()
        .code(2);
}

#[test]
fn test_invalid_config_exits_two() {
    let data = csv_file(DATA);
    let config = csv_file(r#"{"outlier": {"percentile": 0.0}}"#);
    anomaly_scan()
        .arg(data.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .code(2);
}
