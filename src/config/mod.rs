use crate::models::AppSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use secrecy::SecretString;
use std::collections::HashMap;
use std::fs;
use thiserror::Error;

/// Settings file inside the config directory
pub const SETTINGS_FILE: &str = "settings.yaml";

/// Prefix for environment overrides, e.g. `BEVUIHOC__AUDIO__VOLUME=0.5`
pub const ENV_PREFIX: &str = "BEVUIHOC";

/// Environment variables checked for the API credential, in order
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No API key found. Set API_KEY or GEMINI_API_KEY in the environment or in a .env file")]
    MissingApiKey,

    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] config::ConfigError),
}

/// Effective settings plus how they were obtained.
///
/// Settings load before the tracing subscriber exists, so the caller logs
/// the outcome once logging is up.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    pub settings: AppSettings,
    /// A default `settings.yaml` was written because none existed
    pub created_defaults: bool,
}

/// Loads and saves `settings.yaml` and resolves the effective settings.
///
/// Effective settings are layered, later sources winning:
/// 1. built-in defaults
/// 2. `settings.yaml` in the config directory (optional)
/// 3. `BEVUIHOC__<SECTION>__<KEY>` environment variables
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager over `config_dir` (e.g. "Quiz Data"), creating
    /// the directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            config_dir,
        })
    }

    /// Resolve settings from defaults, the YAML file and the process environment.
    ///
    /// Writes a default `settings.yaml` first if none exists.
    pub fn load_settings(&self) -> Result<LoadedSettings> {
        self.load_with(None)
    }

    /// Like [`load_settings`](Self::load_settings), but environment overrides
    /// come from `env` instead of the process environment.
    pub fn load_settings_with_env(&self, env: HashMap<String, String>) -> Result<AppSettings> {
        self.load_with(Some(env.into_iter().collect()))
            .map(|loaded| loaded.settings)
    }

    fn load_with(&self, env: Option<config::Map<String, String>>) -> Result<LoadedSettings> {
        let created_defaults = self.ensure_settings_file()?;
        let settings = self
            .build_settings(env)
            .with_context(|| format!("Failed to load settings from {}", self.settings_path))?;

        Ok(LoadedSettings {
            settings,
            created_defaults,
        })
    }

    pub fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Read `settings.yaml` on its own, without defaults or environment layering.
    pub fn read_settings_file(&self) -> Result<AppSettings> {
        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))
    }

    /// Returns true when the defaults had to be written.
    fn ensure_settings_file(&self) -> Result<bool> {
        if self.settings_path.exists() {
            return Ok(false);
        }
        self.save_settings(&AppSettings::default())?;
        Ok(true)
    }

    fn build_settings(
        &self,
        env: Option<config::Map<String, String>>,
    ) -> Result<AppSettings, ConfigError> {
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(env);

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppSettings::default())?)
            .add_source(
                config::File::new(self.settings_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(environment)
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

/// Read the API credential from the process environment.
///
/// Call after `dotenvy::dotenv()` so a `.env` file is honoured.
pub fn load_api_key() -> Result<SecretString, ConfigError> {
    api_key_from(|name| std::env::var(name).ok())
}

/// Resolve the API credential through `lookup`; blank values count as missing.
pub fn api_key_from<F>(lookup: F) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .map(SecretString::from)
        .ok_or(ConfigError::MissingApiKey)
}
