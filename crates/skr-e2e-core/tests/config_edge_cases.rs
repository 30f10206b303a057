use std::fs;
use std::path::PathBuf;

use skr_e2e_core::config::{Config, ConfigError};
use tempfile::TempDir;

/// Returns true if running as root (euid == 0). Used to skip permission tests.
#[cfg(unix)]
fn is_root() -> bool {
    std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Missing or empty files
// ---------------------------------------------------------------------------

#[test]
fn load_from_nonexistent_path_returns_default_config() {
    let path = PathBuf::from("/tmp/skr-tester-test-nonexistent/does/not/exist/config.toml");
    assert!(!path.exists());

    let config = Config::load_from_path(&path).expect("missing file should yield defaults");

    assert!(config.keb.is_none());
    assert!(config.kcp.is_none());
    assert!(config.gardener.is_none());
    assert_eq!(config.poll.interval_secs, 30);
}

#[test]
fn load_empty_config_file_returns_default_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let config = Config::load_from_path(&config_path).expect("empty file should parse as default");

    assert!(config.keb.is_none());
    assert_eq!(config.poll.timeout_secs, 3600);
}

// ---------------------------------------------------------------------------
// Invalid content
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[keb\nurl = ").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn load_keb_section_missing_plan_returns_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[keb]
url = "https://keb.example.com"
"#,
    )
    .unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(err.to_string().contains("plan_id"), "got: {err}");
}

#[test]
fn load_config_with_unknown_fields_ignores_them() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
legacy_option = true

[gardener]
api_url = "https://api.gardener.example.com"
namespace = "garden-kyma"
token = "t"
kubeconfig = "unused"
"#,
    )
    .unwrap();

    let config =
        Config::load_from_path(&config_path).expect("unknown fields should be silently ignored");

    assert_eq!(config.gardener().unwrap().namespace, "garden-kyma");
}

#[test]
fn unset_variable_without_default_is_kept_literally() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[gardener]
api_url = "https://api.gardener.example.com"
namespace = "garden-kyma"
token = "${SKR_TESTER_SURELY_UNSET_TOKEN}"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    assert_eq!(
        config.gardener().unwrap().token,
        "${SKR_TESTER_SURELY_UNSET_TOKEN}"
    );
}

// ---------------------------------------------------------------------------
// Permission errors (unix only)
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn load_unreadable_file_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# valid toml").unwrap();
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o000)).unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::LoadError { .. }));

    // Restore permissions so TempDir cleanup can remove the file
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn kcp_config_in_readonly_directory_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let readonly_dir = dir.path().join("readonly");
    fs::create_dir(&readonly_dir).unwrap();
    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o444)).unwrap();

    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[kcp]
auth_type = "password"
keb_api_url = "https://kyma-env-broker.example.com"
config_path = "{}"
"#,
            readonly_dir.join("kcp-config.yaml").display()
        ),
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    let err = config.kcp().unwrap().write_cli_config().unwrap_err();
    assert!(matches!(err, ConfigError::SaveError { .. }));
    assert!(err.to_string().contains("kcp-config.yaml"));

    // Restore permissions so TempDir cleanup can remove the directory
    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o755)).unwrap();
}
