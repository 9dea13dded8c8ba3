use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_help_lists_config_flags() {
    let mut cmd = Command::new(cargo_bin!("hovertask"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--bind"));
}

#[test]
fn test_missing_config_file_fails() {
    let mut cmd = Command::new(cargo_bin!("hovertask"));
    cmd.args(["--config", "/nonexistent/hovertask.toml"]);
    cmd.assert().failure();
}
