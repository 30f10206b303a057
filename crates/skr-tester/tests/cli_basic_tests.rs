use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test command
fn skr_tester() -> Command {
    let mut cmd = Command::cargo_bin("skr-tester").unwrap();
    // Keep the developer's environment out of the tests
    cmd.env_remove("SKR_TESTER_CONFIG_FILE")
        .env_remove("KCP_OIDC_CLIENT_SECRET")
        .env_remove("RUST_LOG");
    cmd
}

/// An empty config file, so no section is configured
fn empty_config(dir: &TempDir) -> String {
    let path = dir.path().join("config.toml");
    fs::write(&path, "").unwrap();
    path.display().to_string()
}

#[test]
fn test_help_flag() {
    skr_tester()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SKR lifecycle tester"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_help_short_flag() {
    skr_tester()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    skr_tester()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skr-tester"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_args_shows_help() {
    skr_tester()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    skr_tester()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_subcommand_help() {
    for (command, text) in [
        ("provision", "--plan-id"),
        ("update", "--update-machine-type"),
        ("deprovision", "--wait-timeout"),
        ("wait", "--operation-id"),
        ("kubeconfig", "--oidc-issuer-url"),
    ] {
        skr_tester()
            .arg(command)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(text));
    }
}

#[test]
fn test_provision_requires_plan_and_region() {
    skr_tester()
        .arg("provision")
        .arg("--region")
        .arg("eu-central-1")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--plan-id"));

    skr_tester()
        .arg("provision")
        .arg("-p")
        .arg("plan")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--region"));
}

#[test]
fn test_update_requires_instance_id() {
    skr_tester()
        .arg("update")
        .arg("-p")
        .arg("plan")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--instance-id"));
}

#[test]
fn test_invalid_output_format() {
    skr_tester()
        .arg("-o")
        .arg("table")
        .arg("wait")
        .arg("-i")
        .arg("inst-1")
        .arg("--operation-id")
        .arg("op-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_missing_keb_section_is_reported() {
    let dir = TempDir::new().unwrap();
    skr_tester()
        .arg("--config-file")
        .arg(empty_config(&dir))
        .arg("provision")
        .arg("-p")
        .arg("plan")
        .arg("-r")
        .arg("eu-central-1")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No [keb] section configured"))
        .stderr(predicate::str::contains("tip"));
}

#[test]
fn test_config_file_from_env() {
    let dir = TempDir::new().unwrap();
    skr_tester()
        .env("SKR_TESTER_CONFIG_FILE", empty_config(&dir))
        .arg("deprovision")
        .arg("-i")
        .arg("inst-1")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[keb]"));
}

#[test]
fn test_corrupt_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[keb\nurl =").unwrap();

    skr_tester()
        .arg("--config-file")
        .arg(path.display().to_string())
        .arg("kubeconfig")
        .arg("-i")
        .arg("inst-1")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_update_without_change_is_rejected() {
    let dir = TempDir::new().unwrap();
    skr_tester()
        .arg("--config-file")
        .arg(empty_config(&dir))
        .arg("update")
        .arg("-i")
        .arg("inst-1")
        .arg("-p")
        .arg("plan")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--update-machine-type"));
}

#[test]
fn test_global_flags_after_subcommand() {
    let dir = TempDir::new().unwrap();
    skr_tester()
        .arg("deprovision")
        .arg("-i")
        .arg("inst-1")
        .arg("-vv")
        .arg("-o")
        .arg("json")
        .arg("--config-file")
        .arg(empty_config(&dir))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("[keb]"));
}
