//! Integration tests for ConfigManager and settings layering
//!
//! These tests verify:
//! - Default settings generation on first run
//! - YAML overrides, including partial files
//! - Environment overrides winning over the file
//! - Rejection of malformed files and values
//! - API key resolution

use bevuihoc::config::{ConfigError, api_key_from};
use bevuihoc::{AppSettings, ConfigManager};
use camino::Utf8PathBuf;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_create_config_manager_creates_directory() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("Quiz Data");

    let manager = ConfigManager::new(&nested).unwrap();

    assert!(nested.is_dir());
    assert_eq!(manager.config_dir(), nested.as_path());
    assert_eq!(
        manager.settings_path(),
        nested.join("settings.yaml").as_path()
    );
}

#[test]
fn test_first_run_writes_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let settings = manager.load_settings_with_env(HashMap::new()).unwrap();

    assert_eq!(settings, AppSettings::default());
    assert_eq!(settings.api.quiz_model, "gemini-2.5-flash");
    assert!(settings.audio.enabled);

    let written = fs::read_to_string(manager.settings_path()).unwrap();
    assert!(written.contains("quiz_model"));
    assert!(!written.to_lowercase().contains("api_key"));
}

#[test]
fn test_load_settings_reports_first_run() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let first = assert_ok!(manager.load_settings());
    assert!(first.created_defaults);
    assert!(manager.settings_path().exists());

    let second = assert_ok!(manager.load_settings());
    assert!(!second.created_defaults);
}

#[test]
fn test_yaml_overrides_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        manager.settings_path(),
        "api:\n  voice_name: Kore\naudio:\n  volume: 0.25\nlogging:\n  debug: true\n",
    )
    .unwrap();

    let settings = manager.load_settings_with_env(HashMap::new()).unwrap();

    assert_eq!(settings.api.voice_name, "Kore");
    assert_eq!(settings.audio.volume, 0.25);
    assert!(settings.logging.debug);
    // untouched keys keep their defaults
    assert_eq!(settings.api.speech_model, "gemini-2.5-flash-preview-tts");
    assert_eq!(settings.logging.prefix, "bevuihoc");
}

#[test]
fn test_environment_overrides_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.settings_path(), "audio:\n  volume: 0.25\n").unwrap();

    let settings = manager
        .load_settings_with_env(env(&[
            ("BEVUIHOC__AUDIO__VOLUME", "0.5"),
            ("BEVUIHOC__AUDIO__ENABLED", "false"),
            ("BEVUIHOC__API__REQUEST_TIMEOUT_SECS", "30"),
            ("UNRELATED__AUDIO__VOLUME", "0.9"),
        ]))
        .unwrap();

    assert_eq!(settings.audio.volume, 0.5);
    assert!(!settings.audio.enabled);
    assert_eq!(settings.api.request_timeout_secs, 30);
    assert_eq!(settings.audio.effective_volume(), 0.0);
}

#[test]
fn test_save_then_read_back() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut settings = AppSettings::default();
    settings.api.base_url = "http://localhost:8080".to_string();
    settings.logging.console = false;
    manager.save_settings(&settings).unwrap();

    assert_eq!(manager.read_settings_file().unwrap(), settings);
    assert_eq!(
        manager.load_settings_with_env(HashMap::new()).unwrap(),
        settings
    );
}

#[test]
fn test_malformed_yaml_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.settings_path(), "audio: [volume: {\n").unwrap();

    assert_err!(manager.load_settings_with_env(HashMap::new()));
    assert_err!(manager.read_settings_file());
}

#[test]
fn test_wrong_value_type_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let result = manager.load_settings_with_env(env(&[(
        "BEVUIHOC__API__REQUEST_TIMEOUT_SECS",
        "soon",
    )]));

    assert_err!(result);
}

#[test]
fn test_api_key_resolution() {
    let vars = env(&[("GEMINI_API_KEY", "  secret-key  ")]);
    let key = assert_ok!(api_key_from(|name| vars.get(name).cloned()));
    assert_eq!(key.expose_secret(), "secret-key");

    let empty: HashMap<String, String> = env(&[("API_KEY", "")]);
    assert!(matches!(
        api_key_from(|name| empty.get(name).cloned()),
        Err(ConfigError::MissingApiKey)
    ));
}
