mod support;

use predicates::prelude::*;
use std::fs;

use support::{assert_timestamp_log_names, new_command_with_temp_home, write_valid_config};

#[test]
fn root_help_runs_without_config() {
    let (mut command, _temp_home) = new_command_with_temp_home();
    command
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: treetally"))
        .stdout(predicate::str::contains("--diagnostics"))
        .stdout(predicate::str::contains("doctor"))
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("details"));
}

#[test]
fn submit_help_lists_measurement_flags() {
    let (mut command, _temp_home) = new_command_with_temp_home();
    command
        .args(["submit", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--tree-id"))
        .stdout(predicate::str::contains("HEIGHT:DIAMETER"))
        .stdout(predicate::str::contains("--image"));
}

#[test]
fn doctor_runs_without_config() {
    let (mut command, _temp_home) = new_command_with_temp_home();
    command
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("config file exists"))
        .stdout(predicate::str::contains(".config/treetally/config.toml"));
}

#[test]
fn doctor_passes_config_checks_with_valid_config() {
    let (mut command, temp_home) = new_command_with_temp_home();
    write_valid_config(temp_home.path());

    command
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("signed in as asha@example.edu"))
        .stdout(predicate::str::contains("0 photo(s)"));
}

#[test]
fn root_command_is_gated_without_config() {
    let (mut command, _temp_home) = new_command_with_temp_home();
    command
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing config at"))
        .stderr(predicate::str::contains(".config/treetally/config.toml"));
}

#[test]
fn invalid_config_is_reported_before_any_command_runs() {
    let (mut command, temp_home) = new_command_with_temp_home();
    let config_dir = temp_home.path().join(".config/treetally");
    fs::create_dir_all(&config_dir).expect("config dir");
    fs::write(config_dir.join("config.toml"), "version = 2\n").expect("write config");

    command
        .args(["details", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config at"));
}

#[test]
fn doctor_with_diagnostics_creates_log_file() {
    let (mut command, temp_home) = new_command_with_temp_home();
    command
        .args(["--diagnostics", "doctor"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Diagnostics enabled:"));

    let diagnostics_dir = temp_home.path().join(".config/treetally/diagnostics");
    let logs: Vec<_> = fs::read_dir(&diagnostics_dir)
        .expect("diagnostics dir")
        .filter_map(Result::ok)
        .collect();
    assert_timestamp_log_names(&logs);

    let contents = fs::read_to_string(logs[0].path()).expect("log contents");
    assert!(contents.starts_with("treetally diagnostics start"));
    assert!(contents.contains("command=Some(Doctor)"));
}
