//! Configuration loading, validation, and management for Parley.
//!
//! Loads configuration from `~/.parley/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.parley/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User id assigned to contexts created without one
    #[serde(default = "default_user_id")]
    pub default_user_id: String,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Chat client configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Sentiment word lists
    #[serde(default)]
    pub sentiment: SentimentConfig,
}

fn default_user_id() -> String {
    "default_user".into()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allow any origin, method and header (browser demo clients)
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_permissive: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Whole-token word lists; a positive hit wins over a negative one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    #[serde(default = "default_positive_words")]
    pub positive_words: Vec<String>,

    #[serde(default = "default_negative_words")]
    pub negative_words: Vec<String>,
}

fn default_positive_words() -> Vec<String> {
    ["happy", "good", "great", "excellent", "love", "like"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_negative_words() -> Vec<String> {
    ["sad", "bad", "terrible", "hate", "dislike"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            positive_words: default_positive_words(),
            negative_words: default_negative_words(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.parley/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `PARLEY_HOST`
    /// - `PARLEY_PORT`
    /// - `PARLEY_DEFAULT_USER`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("PARLEY_HOST") {
            self.gateway.host = host;
        }

        if let Some(port) = lookup("PARLEY_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("PARLEY_PORT is not a valid port: {port}"))
            })?;
        }

        if let Some(user) = lookup("PARLEY_DEFAULT_USER") {
            self.default_user_id = user;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parley")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_user_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_user_id must not be empty".into(),
            ));
        }

        if self.gateway.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.host must not be empty".into(),
            ));
        }

        // Sentiment matching is per whitespace token, so a phrase could never match.
        let words = self
            .sentiment
            .positive_words
            .iter()
            .chain(&self.sentiment.negative_words);
        for word in words {
            if word.is_empty() || word.chars().any(char::is_whitespace) {
                return Err(ConfigError::ValidationError(format!(
                    "sentiment word must be a single token: {word:?}"
                )));
            }
        }

        Ok(())
    }

    /// Address the gateway binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
            gateway: GatewayConfig::default(),
            client: ClientConfig::default(),
            sentiment: SentimentConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_user_id, "default_user");
        assert_eq!(config.gateway.port, 8000);
        assert!(config.gateway.cors_permissive);
        assert_eq!(config.sentiment.positive_words.len(), 6);
        assert_eq!(config.sentiment.negative_words.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_user_id, config.default_user_id);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.sentiment.positive_words, config.sentiment.positive_words);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().gateway.port, 8000);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_user_id = "alice"

[gateway]
port = 9100

[sentiment]
positive_words = ["stoked"]
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_user_id, "alice");
        assert_eq!(config.gateway.port, 9100);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.sentiment.positive_words, vec!["stoked".to_string()]);
        assert_eq!(config.sentiment.negative_words.len(), 5);
        assert_eq!(config.client.base_url, "http://localhost:8000");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway\nport = ").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn multi_word_sentiment_rejected() {
        let mut config = AppConfig::default();
        config.sentiment.negative_words.push("not good".into());
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PARLEY_HOST", "0.0.0.0"),
            ("PARLEY_PORT", "9000"),
            ("PARLEY_DEFAULT_USER", "u1"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.default_user_id, "u1");
    }

    #[test]
    fn bad_port_override_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|k| (k == "PARLEY_PORT").then(|| "eighty".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("default_user"));
        assert!(toml_str.contains("8000"));
    }
}
