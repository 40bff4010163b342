use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::secret_store::{self, SecretReference, SecretStoreError};

const CONFIG_DIR_NAME: &str = "snapcal";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
/// Relay origin used when relay mode is selected without an explicit URL.
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:4096";

/// Result returned by [`load_config`], capturing the source and any
/// non-fatal issues found while sanitizing.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Ser(toml::ser::Error),
    Secret(SecretStoreError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {err}"),
            ConfigError::Ser(err) => write!(f, "TOML serialization error: {err}"),
            ConfigError::Secret(err) => write!(f, "Secret storage error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Ser(value)
    }
}

impl From<SecretStoreError> for ConfigError {
    fn from(value: SecretStoreError) -> Self {
        Self::Secret(value)
    }
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub runtime: RuntimePreferences,
    #[serde(default)]
    pub ui: UiPreferences,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            runtime: RuntimePreferences::default(),
            ui: UiPreferences::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

/// An API credential as it appears in config: either plaintext awaiting
/// migration, or a reference into the secret store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SecretValue {
    Plain(String),
    Reference(SecretReference),
}

impl SecretValue {
    fn take_plain(&self) -> Option<String> {
        match self {
            SecretValue::Plain(value) => Some(value.clone()),
            SecretValue::Reference(_) => None,
        }
    }
}

/// How extraction requests reach the model service.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    /// The client holds the credential and calls the model service itself.
    #[default]
    Direct,
    /// Requests go through a relay that holds the credential.
    Relay,
}

/// Runtime preferences shared by CLI and GUI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimePreferences {
    #[serde(default)]
    pub transport: TransportMode,
    #[serde(default = "RuntimePreferences::default_relay_url")]
    pub relay_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<SecretValue>,
}

impl Default for RuntimePreferences {
    fn default() -> Self {
        Self {
            transport: TransportMode::default(),
            relay_url: Self::default_relay_url(),
            model: None,
            api_key: None,
        }
    }
}

impl RuntimePreferences {
    fn default_relay_url() -> String {
        DEFAULT_RELAY_URL.to_string()
    }

    /// Model id to use, falling back to the default.
    pub fn effective_model(&self) -> String {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_string()
    }

    pub fn set_api_key(&mut self, api_key: &str) -> Result<(), SecretStoreError> {
        let trimmed = api_key.trim();
        if trimmed.is_empty() {
            return self.clear_api_key();
        }

        if let Some(SecretValue::Reference(existing)) = self.api_key.as_ref() {
            // Remove the previous stored secret so the store holds no stale entries.
            let _ = secret_store::forget(existing);
        }

        let reference = secret_store::store("api_key", trimmed)?;
        self.api_key = Some(SecretValue::Reference(reference));
        Ok(())
    }

    pub fn clear_api_key(&mut self) -> Result<(), SecretStoreError> {
        if let Some(SecretValue::Reference(reference)) = self.api_key.as_ref() {
            secret_store::forget(reference)?;
        }
        self.api_key = None;
        Ok(())
    }

    /// Move a plaintext key from config.toml into the secret store.
    /// Returns true when the config changed.
    pub fn migrate_api_key(&mut self) -> Result<bool, SecretStoreError> {
        let Some(plain) = self.api_key.as_ref().and_then(SecretValue::take_plain) else {
            return Ok(false);
        };

        let trimmed = plain.trim();
        if trimmed.is_empty() {
            self.api_key = None;
            return Ok(true);
        }

        let reference = secret_store::store("api_key", trimmed)?;
        self.api_key = Some(SecretValue::Reference(reference));
        Ok(true)
    }

    pub fn resolve_api_key(&self) -> Result<Option<String>, SecretStoreError> {
        match self.api_key.as_ref() {
            Some(SecretValue::Reference(reference)) => secret_store::load(reference),
            Some(SecretValue::Plain(value)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// UI-only preferences the GUI persists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiPreferences {
    #[serde(default)]
    pub theme: ThemePreference,
    #[serde(default)]
    pub show_technical_log: bool,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            theme: ThemePreference::Dark,
            show_technical_log: false,
        }
    }
}

/// Theme preference options.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ThemePreference {
    Light,
    #[default]
    Dark,
    System,
}

/// Path to the configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to `config.toml`.
pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration, falling back to defaults on any problem.
pub fn load_config() -> ConfigLoadResult {
    let mut warnings = Vec::new();
    let path = config_path();

    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(config) => {
                    let (config, mut sanitize_warnings, secrets_migrated) = sanitize_config(config);
                    warnings.append(&mut sanitize_warnings);
                    if secrets_migrated {
                        if let Err(err) = save_config(&config) {
                            warnings
                                .push(format!("Failed to persist secure secret updates: {err}"));
                        }
                    }
                    return ConfigLoadResult {
                        config,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {CONFIG_FILE_NAME} as TOML: {err}. Falling back to defaults."
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {CONFIG_FILE_NAME}: {err}. Falling back to defaults."
                ));
            }
        }
    }

    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

/// Persist the configuration to disk, never writing a plaintext secret.
pub fn save_config(config: &FileConfig) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut config_to_write = config.clone();
    config_to_write.runtime.migrate_api_key()?;
    let serialized = toml::to_string_pretty(&config_to_write)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>, bool) {
    let mut warnings = Vec::new();
    let mut secrets_migrated = false;

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown config schema version {}. Resetting to {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        return (FileConfig::default(), warnings, secrets_migrated);
    }

    if config.runtime.relay_url.trim().is_empty() {
        warnings.push(format!(
            "Relay URL is empty. Resetting to {DEFAULT_RELAY_URL}."
        ));
        config.runtime.relay_url = DEFAULT_RELAY_URL.to_string();
    } else if !config.runtime.relay_url.starts_with("http://")
        && !config.runtime.relay_url.starts_with("https://")
    {
        warnings.push(format!(
            "Relay URL '{}' is not an http(s) origin. Resetting to {DEFAULT_RELAY_URL}.",
            config.runtime.relay_url
        ));
        config.runtime.relay_url = DEFAULT_RELAY_URL.to_string();
    }

    if let Some(model) = config.runtime.model.as_ref() {
        if model.trim().is_empty() {
            config.runtime.model = None;
        }
    }

    match config.runtime.migrate_api_key() {
        Ok(true) => {
            warnings.push("Migrated stored API key into secure storage.".to_string());
            secrets_migrated = true;
        }
        Ok(false) => {}
        Err(err) => {
            warnings.push(format!(
                "Failed to secure stored API key: {err}. Clearing the saved key."
            ));
            let _ = config.runtime.clear_api_key();
            secrets_migrated = true;
        }
    }

    (config, warnings, secrets_migrated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_wrong_schema_version_resets() {
        let mut config = FileConfig::default();
        config.schema_version = 999;
        config.runtime.relay_url = "https://relay.example".to_string();

        let (sanitized, warnings, _) = sanitize_config(config);

        assert_eq!(sanitized.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(sanitized.runtime, RuntimePreferences::default());
        assert!(
            warnings.iter().any(|w| w.contains("schema version")),
            "should warn about unknown schema version"
        );
    }

    #[test]
    fn test_sanitize_empty_relay_url_resets_to_default() {
        let mut config = FileConfig::default();
        config.runtime.relay_url = "   ".to_string();

        let (sanitized, warnings, _) = sanitize_config(config);

        assert_eq!(sanitized.runtime.relay_url, DEFAULT_RELAY_URL);
        assert!(warnings.iter().any(|w| w.contains("Relay URL")));
    }

    #[test]
    fn test_sanitize_non_http_relay_url_resets() {
        let mut config = FileConfig::default();
        config.runtime.relay_url = "ftp://relay.example".to_string();

        let (sanitized, warnings, _) = sanitize_config(config);

        assert_eq!(sanitized.runtime.relay_url, DEFAULT_RELAY_URL);
        assert!(warnings.iter().any(|w| w.contains("not an http(s)")));
    }

    #[test]
    fn test_sanitize_blank_model_becomes_none() {
        let mut config = FileConfig::default();
        config.runtime.model = Some("  ".to_string());

        let (sanitized, _, _) = sanitize_config(config);
        assert!(sanitized.runtime.model.is_none());
        assert_eq!(sanitized.runtime.effective_model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_effective_model_prefers_configured_value() {
        let mut prefs = RuntimePreferences::default();
        prefs.model = Some("anthropic/claude-sonnet-4.5".to_string());
        assert_eq!(prefs.effective_model(), "anthropic/claude-sonnet-4.5");
    }

    #[test]
    fn test_transport_mode_round_trips_through_toml() {
        let mut config = FileConfig::default();
        config.runtime.transport = TransportMode::Relay;

        let serialized = toml::to_string_pretty(&config).expect("serialize");
        assert!(serialized.contains("transport = \"relay\""));

        let parsed: FileConfig = toml::from_str(&serialized).expect("parse");
        assert_eq!(parsed.runtime.transport, TransportMode::Relay);
    }

    #[test]
    fn test_defaults_are_direct_mode_without_key() {
        let config = FileConfig::default();
        assert_eq!(config.runtime.transport, TransportMode::Direct);
        assert!(!config.runtime.has_api_key());
        assert_eq!(config.runtime.relay_url, DEFAULT_RELAY_URL);
    }
}
