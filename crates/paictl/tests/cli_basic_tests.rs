use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Command with a private config file and no ambient credentials
fn paictl(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("paictl").unwrap();
    cmd.arg("--config-file")
        .arg(config)
        .env_remove("PAICTL_PROFILE")
        .env_remove("PAICTL_CONFIG_FILE")
        .env_remove("ALIBABA_CLOUD_ACCESS_KEY_ID")
        .env_remove("ALIBABA_CLOUD_ACCESS_KEY_SECRET")
        .env_remove("ALIBABA_CLOUD_SECURITY_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn bare() -> Command {
    Command::cargo_bin("paictl").unwrap()
}

fn set_profile(config: &Path, name: &str, extra: &[&str]) {
    paictl(config)
        .args([
            "profile",
            "set",
            name,
            "--access-key-id",
            "LTAI5tExampleId",
            "--access-key-secret",
            "example-secret",
        ])
        .args(extra)
        .assert()
        .success();
}

#[test]
fn test_help_flag() {
    bare()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Platform for AI"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    bare()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("paictl"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_args_shows_help() {
    bare()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    bare()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_service_help_lists_lifecycle_commands() {
    bare()
        .args(["service", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("scale").or(predicate::str::contains("update")))
        .stdout(predicate::str::contains("wait"));
}

#[test]
fn test_version_command_json() {
    let dir = TempDir::new().unwrap();
    paictl(&dir.path().join("config.toml"))
        .args(["version", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"paictl\""));
}

#[test]
fn test_invalid_output_format() {
    let dir = TempDir::new().unwrap();
    paictl(&dir.path().join("config.toml"))
        .args(["profile", "list", "-o", "csv"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_profile_list_empty() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    paictl(&config)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles configured"));

    paictl(&config)
        .args(["profile", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_profile_set_show_remove() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    set_profile(&config, "prod", &["--region-id", "cn-shanghai", "--workspace-id", "ws-9"]);
    assert!(config.exists());

    paictl(&config)
        .args(["profile", "list", "-o", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: prod"))
        .stdout(predicate::str::contains("RegionId: cn-shanghai"));

    paictl(&config)
        .args(["profile", "show", "prod", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LTAI****"))
        .stdout(predicate::str::contains("\"Default\": true"))
        .stdout(predicate::str::contains("example-secret").not());

    paictl(&config)
        .args(["profile", "remove", "prod"])
        .assert()
        .success();

    paictl(&config)
        .args(["profile", "show", "prod"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("prod"));
}

#[test]
fn test_profile_remove_with_keyring_secret() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    paictl(&config)
        .args([
            "profile",
            "set",
            "shared-a",
            "--access-key-id",
            "LTAI5tExampleId",
            "--access-key-secret",
            "keyring:team-secret",
        ])
        .assert()
        .success();
    paictl(&config)
        .args([
            "profile",
            "set",
            "shared-b",
            "--access-key-id",
            "LTAI5tExampleId",
            "--access-key-secret",
            "keyring:team-secret",
        ])
        .assert()
        .success();

    paictl(&config)
        .args(["profile", "remove", "shared-a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'shared-a' removed"));

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(!saved.contains("shared-a"));
    assert!(saved.contains("keyring:team-secret"));
}

#[test]
fn test_profile_endpoint_override_is_saved() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");

    set_profile(
        &config,
        "vpc",
        &["--endpoint", "eas=https://pai-eas-vpc.cn-hangzhou.aliyuncs.com"],
    );

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains("pai-eas-vpc.cn-hangzhou.aliyuncs.com"));
}

#[test]
fn test_profile_endpoint_rejects_unknown_product() {
    let dir = TempDir::new().unwrap();
    paictl(&dir.path().join("config.toml"))
        .args([
            "profile",
            "set",
            "bad",
            "--access-key-id",
            "id",
            "--access-key-secret",
            "secret",
            "--endpoint",
            "oss=https://example.com",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown product"));
}

#[test]
fn test_resource_command_without_profile() {
    let dir = TempDir::new().unwrap();
    paictl(&dir.path().join("config.toml"))
        .args(["dataset", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("paictl profile set"));
}

#[test]
fn test_run_create_requires_a_source() {
    let dir = TempDir::new().unwrap();
    paictl(&dir.path().join("config.toml"))
        .args(["run", "create", "--name", "nightly"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_order_requires_sort_by() {
    let dir = TempDir::new().unwrap();
    paictl(&dir.path().join("config.toml"))
        .args(["model", "list", "--order", "desc"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--sort-by"));
}
