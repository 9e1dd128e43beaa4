//! Configuration resolution and graceful degradation tests
//!
//! Tests that manipulate TAGDESK_BASE_URL are marked #[serial] so they do not
//! race each other on the process environment.

use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tagdesk_common::config::{
    load_toml_config, BusyDisplay, ClientConfig, TomlConfig, BASE_URL_ENV, DEFAULT_BASE_URL,
};
use tagdesk_common::Error;

#[test]
#[serial]
fn test_resolve_defaults_without_overrides() {
    env::remove_var(BASE_URL_ENV);

    let config = ClientConfig::resolve(None, &TomlConfig::default()).unwrap();

    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.min_busy, Duration::from_millis(2000));
    assert_eq!(config.busy_display, BusyDisplay::Split);
    assert_eq!(config.event_capacity, 100);
}

#[test]
#[serial]
fn test_resolve_cli_beats_env_and_toml() {
    env::set_var(BASE_URL_ENV, "http://env-host:9000");
    let toml_config = TomlConfig {
        base_url: Some("http://toml-host:7000".to_string()),
        ..Default::default()
    };

    let config = ClientConfig::resolve(Some("http://cli-host:8100/"), &toml_config).unwrap();
    assert_eq!(config.base_url, "http://cli-host:8100");

    env::remove_var(BASE_URL_ENV);
}

#[test]
#[serial]
fn test_resolve_env_beats_toml() {
    env::set_var(BASE_URL_ENV, "http://env-host:9000");
    let toml_config = TomlConfig {
        base_url: Some("http://toml-host:7000".to_string()),
        ..Default::default()
    };

    let config = ClientConfig::resolve(None, &toml_config).unwrap();
    assert_eq!(config.base_url, "http://env-host:9000");

    env::remove_var(BASE_URL_ENV);
}

#[test]
#[serial]
fn test_resolve_blank_env_is_ignored() {
    env::set_var(BASE_URL_ENV, "   ");
    let toml_config = TomlConfig {
        base_url: Some("http://toml-host:7000".to_string()),
        ..Default::default()
    };

    let config = ClientConfig::resolve(None, &toml_config).unwrap();
    assert_eq!(config.base_url, "http://toml-host:7000");

    env::remove_var(BASE_URL_ENV);
}

#[test]
#[serial]
fn test_resolve_rejects_invalid_url() {
    env::remove_var(BASE_URL_ENV);

    let result = ClientConfig::resolve(Some("ftp://somewhere"), &TomlConfig::default());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_resolve_rejects_zero_event_capacity() {
    env::remove_var(BASE_URL_ENV);
    let toml_config = TomlConfig {
        event_capacity: Some(0),
        ..Default::default()
    };

    assert!(matches!(
        ClientConfig::resolve(None, &toml_config),
        Err(Error::Config(_))
    ));
}

#[test]
#[serial]
fn test_load_explicit_toml_file() {
    env::remove_var(BASE_URL_ENV);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
base_url = "http://docs.internal:8000"
request_timeout_secs = 5
min_busy_ms = 0
busy_display = "unified"

[logging]
level = "debug"
"#
    )
    .unwrap();

    let toml_config = load_toml_config(Some(file.path())).unwrap();
    assert_eq!(toml_config.logging.level, "debug");

    let config = ClientConfig::resolve(None, &toml_config).unwrap();
    assert_eq!(config.base_url, "http://docs.internal:8000");
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.min_busy, Duration::ZERO);
    assert_eq!(config.busy_display, BusyDisplay::Unified);
}

#[test]
fn test_load_missing_explicit_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    match load_toml_config(Some(&missing)) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_load_malformed_explicit_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "base_url = [unterminated").unwrap();

    assert!(matches!(
        load_toml_config(Some(file.path())),
        Err(Error::Config(_))
    ));
}
