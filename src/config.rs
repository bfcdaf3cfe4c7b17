//! Configuration management for thirdbrain
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, ThirdBrainError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default system instruction, also used as the first message of every session
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are 3rd Brain, a helpful assistant with expertise in various topics. Provide concise, accurate and helpful responses.";

/// Main configuration structure for thirdbrain
///
/// Holds the completion endpoint settings, decoding options, history
/// formatting rules, and snapshot storage location.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Completion endpoint and model selection
    #[serde(default)]
    pub model: ModelConfig,

    /// Decoding options sent with every request
    #[serde(default)]
    pub options: DecodingOptions,

    /// How session history is turned into the outbound message list
    #[serde(default)]
    pub formatting: FormattingConfig,

    /// Where the session snapshot is persisted
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Model identifier sent in the request body
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Base URL of the server (scheme, host, port)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the chat endpoint, appended to `base_url`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request incremental (newline-delimited JSON) responses
    #[serde(default = "default_stream")]
    pub stream: bool,

    /// Optional request timeout; unset means the request may wait indefinitely
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_model_name() -> String {
    "dolphin-mistral".to_string()
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_endpoint() -> String {
    "/api/chat".to_string()
}

fn default_stream() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            stream: default_stream(),
            timeout_seconds: None,
        }
    }
}

impl ModelConfig {
    /// Full URL of the chat endpoint
    ///
    /// # Examples
    ///
    /// ```
    /// use thirdbrain::config::ModelConfig;
    ///
    /// let config = ModelConfig {
    ///     base_url: "http://localhost:11434/".to_string(),
    ///     ..Default::default()
    /// };
    /// assert_eq!(config.chat_url(), "http://localhost:11434/api/chat");
    /// ```
    pub fn chat_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.endpoint.starts_with('/') {
            format!("{}{}", base, self.endpoint)
        } else {
            format!("{}/{}", base, self.endpoint)
        }
    }
}

/// Sampling and length options forwarded to the model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DecodingOptions {
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus-sampling threshold
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Maximum number of output tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// History formatting configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormattingConfig {
    /// System instruction prepended to every request and seeded into new sessions
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Prepend `system_prompt` to the outbound message list
    #[serde(default = "default_true")]
    pub include_system_prompt: bool,

    /// Send recent history; when false only the latest message is sent
    #[serde(default = "default_true")]
    pub include_previous_messages: bool,

    /// Maximum number of non-system messages sent when history is included
    #[serde(default = "default_max_previous_messages")]
    pub max_previous_messages: usize,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_previous_messages() -> usize {
    10
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            include_system_prompt: true,
            include_previous_messages: true,
            max_previous_messages: default_max_previous_messages(),
        }
    }
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Path of the embedded database directory; the platform data dir when unset
    #[serde(default)]
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ThirdBrainError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ThirdBrainError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(model) = std::env::var("THIRDBRAIN_MODEL") {
            self.model.name = model;
        }

        if let Ok(base_url) = std::env::var("THIRDBRAIN_BASE_URL") {
            self.model.base_url = base_url;
        }

        if let Ok(endpoint) = std::env::var("THIRDBRAIN_ENDPOINT") {
            self.model.endpoint = endpoint;
        }

        if let Ok(temperature) = std::env::var("THIRDBRAIN_TEMPERATURE") {
            if let Ok(value) = temperature.parse() {
                self.options.temperature = value;
            } else {
                tracing::warn!("Invalid THIRDBRAIN_TEMPERATURE: {}", temperature);
            }
        }

        if let Ok(top_p) = std::env::var("THIRDBRAIN_TOP_P") {
            if let Ok(value) = top_p.parse() {
                self.options.top_p = value;
            } else {
                tracing::warn!("Invalid THIRDBRAIN_TOP_P: {}", top_p);
            }
        }

        if let Ok(max_tokens) = std::env::var("THIRDBRAIN_MAX_TOKENS") {
            if let Ok(value) = max_tokens.parse() {
                self.options.max_tokens = value;
            } else {
                tracing::warn!("Invalid THIRDBRAIN_MAX_TOKENS: {}", max_tokens);
            }
        }

        if let Ok(max_previous) = std::env::var("THIRDBRAIN_MAX_PREVIOUS_MESSAGES") {
            if let Ok(value) = max_previous.parse() {
                self.formatting.max_previous_messages = value;
            } else {
                tracing::warn!("Invalid THIRDBRAIN_MAX_PREVIOUS_MESSAGES: {}", max_previous);
            }
        }

        if let Ok(store_path) = std::env::var("THIRDBRAIN_STORE_PATH") {
            self.storage.path = Some(store_path);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(model) = &cli.model {
            self.model.name = model.clone();
        }

        if let Some(base_url) = &cli.base_url {
            self.model.base_url = base_url.clone();
        }

        if let Some(storage_path) = &cli.storage_path {
            self.storage.path = Some(storage_path.clone());
        }

        if cli.no_stream {
            self.model.stream = false;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.model.name.trim().is_empty() {
            return Err(ThirdBrainError::Config("model.name cannot be empty".to_string()).into());
        }

        let url = url::Url::parse(&self.model.base_url).map_err(|e| {
            ThirdBrainError::Config(format!(
                "model.base_url is not a valid URL ({}): {}",
                self.model.base_url, e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ThirdBrainError::Config(format!(
                "model.base_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.model.endpoint.trim().is_empty() {
            return Err(
                ThirdBrainError::Config("model.endpoint cannot be empty".to_string()).into(),
            );
        }

        if self.model.timeout_seconds == Some(0) {
            return Err(ThirdBrainError::Config(
                "model.timeout_seconds must be greater than 0 when set".to_string(),
            )
            .into());
        }

        if !(0.0..=2.0).contains(&self.options.temperature) {
            return Err(ThirdBrainError::Config(
                "options.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.options.top_p <= 0.0 || self.options.top_p > 1.0 {
            return Err(ThirdBrainError::Config(
                "options.top_p must be greater than 0.0 and at most 1.0".to_string(),
            )
            .into());
        }

        if self.options.max_tokens == 0 {
            return Err(ThirdBrainError::Config(
                "options.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.formatting.include_previous_messages && self.formatting.max_previous_messages == 0
        {
            return Err(ThirdBrainError::Config(
                "formatting.max_previous_messages must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::test_utils::{assert_error_contains, test_config_yaml};
    use clap::Parser;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "dolphin-mistral");
        assert_eq!(config.model.endpoint, "/api/chat");
        assert!(config.model.stream);
        assert!(config.model.timeout_seconds.is_none());
        assert_eq!(config.options.temperature, 0.7);
        assert_eq!(config.options.top_p, 0.9);
        assert_eq!(config.options.max_tokens, 2000);
        assert_eq!(config.formatting.max_previous_messages, 10);
        assert!(config.formatting.include_previous_messages);
        assert_eq!(config.formatting.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_url() {
        let mut config = Config::default();
        config.model.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.model.base_url = "ftp://example.com".to_string();
        assert_error_contains(config.validate(), "must use http or https");
    }

    #[test]
    fn test_config_validation_rejects_out_of_range_options() {
        let mut config = Config::default();
        config.options.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.options.top_p = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.options.max_tokens = 0;
        assert_error_contains(config.validate(), "options.max_tokens");
    }

    #[test]
    fn test_config_validation_zero_history_window() {
        let mut config = Config::default();
        config.formatting.max_previous_messages = 0;
        assert!(config.validate().is_err());

        // Irrelevant when history is not included
        config.formatting.include_previous_messages = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.model.timeout_seconds = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chat_url_joins_without_double_slash() {
        let mut config = ModelConfig::default();
        config.base_url = "https://ai.example.net/".to_string();
        config.endpoint = "api/chat".to_string();
        assert_eq!(config.chat_url(), "https://ai.example.net/api/chat");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
model:
  name: llama3.2:latest
options:
  temperature: 0.2
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.base_url, "http://localhost:11434");
        assert_eq!(config.options.temperature, 0.2);
        assert_eq!(config.options.max_tokens, 2000);
        assert_eq!(config.formatting, FormattingConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_reads_every_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, test_config_yaml()).unwrap();

        let cli = Cli::try_parse_from(["thirdbrain", "sessions", "list"]).unwrap();
        let config = Config::load(path.to_str().unwrap(), &cli).unwrap();

        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.timeout_seconds, Some(30));
        assert_eq!(config.options.max_tokens, 512);
        assert_eq!(config.formatting.max_previous_messages, 4);
        assert_eq!(
            config.storage.path.as_deref(),
            Some("/tmp/thirdbrain-test.db")
        );
    }

    #[test]
    #[serial]
    fn test_load_missing_file_falls_back_to_defaults() {
        let cli = Cli::try_parse_from(["thirdbrain", "sessions", "list"]).unwrap();
        let config = Config::load("/nonexistent/thirdbrain/config.yaml", &cli).unwrap();
        assert_eq!(config.model.name, "dolphin-mistral");
    }

    #[test]
    #[serial]
    fn test_env_overrides_apply() {
        std::env::set_var("THIRDBRAIN_MODEL", "mistral:latest");
        std::env::set_var("THIRDBRAIN_MAX_TOKENS", "512");
        std::env::set_var("THIRDBRAIN_TOP_P", "not-a-number");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("THIRDBRAIN_MODEL");
        std::env::remove_var("THIRDBRAIN_MAX_TOKENS");
        std::env::remove_var("THIRDBRAIN_TOP_P");

        assert_eq!(config.model.name, "mistral:latest");
        assert_eq!(config.options.max_tokens, 512);
        // Invalid values are ignored
        assert_eq!(config.options.top_p, 0.9);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_take_precedence() {
        let cli = Cli::try_parse_from([
            "thirdbrain",
            "--model",
            "llama3.2:latest",
            "--base-url",
            "http://10.0.0.2:11434",
            "--storage-path",
            "/tmp/thirdbrain-test-db",
            "--no-stream",
            "sessions",
            "list",
        ])
        .unwrap();

        let mut config = Config::default();
        config.apply_cli_overrides(&cli);

        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.base_url, "http://10.0.0.2:11434");
        assert_eq!(
            config.storage.path.as_deref(),
            Some("/tmp/thirdbrain-test-db")
        );
        assert!(!config.model.stream);
    }
}
