//! Configuration loading, validation, and management for SeriesAI.
//!
//! Loads configuration from `~/.seriesai/config.toml` with environment
//! variable overrides. Validates all settings at startup; the result is
//! immutable for the life of the process.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.seriesai/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer credential for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model requested on every completion
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Maximum number of history messages sent per completion
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sent as `HTTP-Referer` to identify the application to OpenRouter
    #[serde(default = "default_app_referer")]
    pub app_referer: String,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Messages relay configuration
    #[serde(default)]
    pub relay: RelayConfig,
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model_name() -> String {
    "meta-llama/llama-4-maverick:free".into()
}
fn default_max_context_length() -> usize {
    30
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_app_referer() -> String {
    "https://series.app".into()
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model_name", &self.model_name)
            .field("max_context_length", &self.max_context_length)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("app_referer", &self.app_referer)
            .field("gateway", &self.gateway)
            .field("relay", &self.relay)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
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
        }
    }
}

/// Settings for the Messages polling relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Path to the Messages SQLite database (`~` is expanded)
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Exact prefix that marks a fresh onboarding request
    #[serde(default = "default_greeting_prefix")]
    pub greeting_prefix: String,

    /// Text fed to the agent as the first message of a new conversation
    #[serde(default = "default_start_trigger")]
    pub start_trigger: String,

    /// Conversations idle longer than this stop being polled
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,

    /// Where relay cursors are persisted between runs (`~` is expanded)
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

fn default_db_path() -> String {
    "~/Library/Messages/chat.db".into()
}
fn default_poll_interval_secs() -> u64 {
    5
}
fn default_greeting_prefix() -> String {
    "Welcome to Series! Text your color to get started:".into()
}
fn default_start_trigger() -> String {
    "START_ONBOARDING".into()
}
fn default_stale_after_hours() -> u64 {
    24
}
fn default_state_file() -> String {
    "~/.seriesai/relay_state.json".into()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            poll_interval_secs: default_poll_interval_secs(),
            greeting_prefix: default_greeting_prefix(),
            start_trigger: default_start_trigger(),
            stale_after_hours: default_stale_after_hours(),
            state_file: default_state_file(),
        }
    }
}

impl RelayConfig {
    /// The Messages database path with `~` expanded.
    pub fn db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    /// The relay state file path with `~` expanded.
    pub fn state_file(&self) -> PathBuf {
        expand_home(&self.state_file)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.seriesai/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `SERIESAI_API_KEY`, then `OPENROUTER_API_KEY`
    /// - `SERIESAI_API_URL`
    /// - `MODEL_NAME`
    /// - `MAX_CONTEXT_LENGTH`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path, |key| std::env::var(key).ok())
    }

    /// Load from `path`, apply overrides from `env`, then validate.
    pub fn load_with_env(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(key) = env("SERIESAI_API_KEY").or_else(|| env("OPENROUTER_API_KEY")) {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }

        if let Some(url) = env("SERIESAI_API_URL") {
            self.api_url = url;
        }

        if let Some(model) = env("MODEL_NAME") {
            self.model_name = model;
        }

        if let Some(raw) = env("MAX_CONTEXT_LENGTH") {
            self.max_context_length = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "MAX_CONTEXT_LENGTH must be a positive integer, got '{raw}'"
                ))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".seriesai")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.max_context_length == 0 {
            return Err(ConfigError::ValidationError(
                "max_context_length must be at least 1".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::ValidationError("model_name must not be empty".into()));
        }
        if self.relay.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "relay.poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.relay.greeting_prefix.is_empty() || self.relay.start_trigger.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "relay.greeting_prefix and relay.start_trigger must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
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
            api_key: None,
            api_url: default_api_url(),
            model_name: default_model_name(),
            max_context_length: default_max_context_length(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            app_referer: default_app_referer(),
            gateway: GatewayConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs_home().join(rest),
        None if path == "~" => dirs_home(),
        None => PathBuf::from(path),
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
