//! Configuration loading, validation, and management for ChatRelay.
//!
//! Loads configuration from `~/.chatrelay/config.toml` with environment
//! variable overrides (process environment first, then a `.env` file in the
//! working directory). Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.chatrelay/config.toml`. Built once at startup and
/// handed by value to the components that need it.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion endpoint settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Turn orchestration settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// Message store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP service settings
    #[serde(default)]
    pub gateway: GatewayConfig,
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
            .field("llm", &self.llm)
            .field("relay", &self.relay)
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Full URL of the chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Sent as `HTTP-Referer` (OpenRouter app attribution)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,

    /// Sent as `X-Title` (OpenRouter app attribution)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            referer: None,
            title: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Directive placed first in every prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_primary_model")]
    pub primary_model: String,

    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Per-attempt timeout for a model dispatch
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of prior messages supplied as context
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_system_prompt() -> String {
    "You are a rude website chatbot.\nBe concise, sarcastic, and unprofessional.".into()
}
fn default_primary_model() -> String {
    "meta-llama/llama-3-8b-instruct".into()
}
fn default_fallback_model() -> String {
    "mistralai/mistral-7b-instruct".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_history_window() -> usize {
    6
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            primary_model: default_primary_model(),
            fallback_model: default_fallback_model(),
            timeout_secs: default_timeout_secs(),
            history_window: default_history_window(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite", "memory" or "supabase"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database file
    #[serde(default = "default_store_path")]
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_key: Option<String>,

    /// Table holding the messages
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_store_path() -> String {
    AppConfig::config_dir()
        .join("messages.db")
        .to_string_lossy()
        .into_owned()
}
fn default_table() -> String {
    "messages".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
            supabase_url: None,
            supabase_key: None,
            table: default_table(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("path", &self.path)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &redact(&self.supabase_key))
            .field("table", &self.table)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins; `"*"` allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.chatrelay/config.toml).
    ///
    /// Environment variables override file values:
    /// - `CHATRELAY_API_KEY`, `LLM_API_KEY`, `OPENROUTER_API_KEY` (first found)
    /// - `LLM_ENDPOINT`, `LLM_MODEL`, `LLM_FALLBACK_MODEL`
    /// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::read(&config_path)?;

        let dotenv = load_dotenv(Path::new(".env"));
        config.apply_env_overrides(|key| {
            std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
        });

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without validating it. A missing file yields the
    /// defaults.
    fn read(path: &Path) -> Result<Self, ConfigError> {
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

        Ok(config)
    }

    /// Apply environment overrides using the given variable lookup.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("CHATRELAY_API_KEY")
            .or_else(|| non_empty("LLM_API_KEY"))
            .or_else(|| non_empty("OPENROUTER_API_KEY"))
        {
            self.api_key = Some(key);
        }

        if let Some(endpoint) = non_empty("LLM_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Some(model) = non_empty("LLM_MODEL") {
            self.relay.primary_model = model;
        }
        if let Some(model) = non_empty("LLM_FALLBACK_MODEL") {
            self.relay.fallback_model = model;
        }

        if let Some(url) = non_empty("SUPABASE_URL") {
            self.store.supabase_url = Some(url);
            self.store.backend = "supabase".into();
        }
        if let Some(key) = non_empty("SUPABASE_ANON_KEY") {
            self.store.supabase_key = Some(key);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatrelay")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "relay.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.relay.history_window > 100 {
            return Err(ConfigError::ValidationError(
                "relay.history_window must be at most 100".into(),
            ));
        }

        if self.relay.primary_model.trim().is_empty() || self.relay.fallback_model.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "relay.primary_model and relay.fallback_model must be set".into(),
            ));
        }

        if self.relay.system_prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "relay.system_prompt must not be empty".into(),
            ));
        }

        match self.store.backend.as_str() {
            "sqlite" | "memory" => {}
            "supabase" => {
                if self.store.supabase_url.is_none() || self.store.supabase_key.is_none() {
                    return Err(ConfigError::ValidationError(
                        "supabase store requires store.supabase_url and store.supabase_key".into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown store.backend '{other}' (expected sqlite, memory or supabase)"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Fail fast when the completion endpoint cannot be authenticated.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::ValidationError(
                "LLM API key missing; set api_key in config.toml or LLM_API_KEY".into(),
            )),
        }
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            llm: LlmConfig::default(),
            relay: RelayConfig::default(),
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Parse `KEY=VALUE` lines of a `.env` file.
///
/// Blank lines and `#` comments are skipped; surrounding quotes are stripped.
pub fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            vars.insert(key.to_string(), value.to_string());
        }
    }
    vars
}

/// Read a `.env` file if present. A missing file yields no variables.
pub fn load_dotenv(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::debug!("Loaded environment file {}", path.display());
            parse_dotenv(&contents)
        }
        Err(_) => HashMap::new(),
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
