//! Tests for config module

use licitpy::config::Settings;
use licitpy::errors::AppError;
use licitpy::Licitpy;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_settings_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("licitpy.toml");

    let config_content = r#"
use_cache = false
cache_dir = "custom/cache"
request_timeout_secs = 10
max_retries = 5
concurrency = 4
filter_concurrency = 2
download_dir = "custom/eu"
disable_progress_bar = true
"#;

    fs::write(&config_path, config_content).unwrap();

    let settings = Settings::from_toml_file(&config_path).unwrap();

    assert!(!settings.use_cache);
    assert_eq!(settings.cache_dir, PathBuf::from("custom/cache"));
    assert_eq!(settings.request_timeout_secs, 10);
    assert_eq!(settings.max_retries, 5);
    assert_eq!(settings.concurrency, 4);
    assert_eq!(settings.filter_concurrency, 2);
    assert_eq!(settings.download_dir, PathBuf::from("custom/eu"));
    assert!(settings.disable_progress_bar);
    // Untouched keys keep their defaults
    assert_eq!(settings.cache_expire_after_secs, 3600);
    assert_eq!(settings.retry_initial_delay_ms, 1000);
}

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();

    assert!(settings.use_cache);
    assert_eq!(settings.request_timeout_secs, 30);
    assert_eq!(settings.max_retries, 3);
    assert_eq!(settings.retry_initial_delay_ms, 1000);
    assert_eq!(settings.retry_max_delay_ms, 10000);
    assert_eq!(settings.download_dir, PathBuf::from("data/eu"));
}

#[test]
fn test_settings_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = Settings::from_toml_file(&temp_dir.path().join("missing.toml"));
    assert!(matches!(result, Err(AppError::IoError(_))));
}

#[test]
fn test_settings_malformed_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("licitpy.toml");
    fs::write(&config_path, "use_cache = \"maybe\"").unwrap();

    let err = Settings::from_toml_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
fn test_settings_zero_timeout_rejected_by_client() {
    let settings = Settings {
        request_timeout_secs: 0,
        ..Settings::default()
    };
    let err = Licitpy::with_settings(settings).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid input: Request timeout must be greater than 0"
    );
}
