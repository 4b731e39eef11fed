//! Global configuration types for Farum.
//!
//! `FarumConfig` represents the top-level `config.toml` plus the environment
//! overrides applied on top of it by the loader in farum-infra.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::llm::ProviderType;

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Developer machine: mock generation and in-memory storage by default.
    Local,
    /// Deployed service: a real model is expected.
    Hosted,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Local => write!(f, "local"),
            RunMode::Hosted => write!(f, "hosted"),
        }
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(RunMode::Local),
            "hosted" => Ok(RunMode::Hosted),
            other => Err(format!("invalid run mode: '{other}'")),
        }
    }
}

/// Which storage backend holds sessions, messages and journal entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(format!("invalid storage backend: '{other}'")),
        }
    }
}

/// LLM settings used by reply generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_provider")]
    pub provider: ProviderType,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_provider() -> ProviderType {
    ProviderType::Mock
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_temperature() -> f64 {
    0.6
}

fn default_max_tokens() -> u32 {
    512
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Top-level configuration for a Farum process.
///
/// Loaded from `~/.farum/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarumConfig {
    #[serde(default = "default_mode")]
    pub mode: RunMode,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,
    /// SQLite URL; defaults to `{data_dir}/farum.db` when unset.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub llm: LlmSettings,
    /// Number of recent messages handed to the pipeline as context.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Whether the reflector records journal entries.
    #[serde(default = "default_true")]
    pub journal_enabled: bool,
    #[serde(default)]
    pub log_json: bool,
}

fn default_mode() -> RunMode {
    RunMode::Local
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Memory
}

fn default_history_window() -> usize {
    20
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

impl Default for FarumConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            host: default_host(),
            port: default_port(),
            storage_backend: default_storage_backend(),
            database_url: None,
            llm: LlmSettings::default(),
            history_window: default_history_window(),
            request_timeout_secs: default_request_timeout_secs(),
            journal_enabled: true,
            log_json: false,
        }
    }
}

impl FarumConfig {
    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.history_window == 0 {
            return Err("history_window must be at least 1".to_string());
        }
        if self.port == 0 {
            return Err("port must be non-zero".to_string());
        }
        if self.llm.provider == ProviderType::Anthropic && self.llm.api_key_env.trim().is_empty() {
            return Err("llm.api_key_env must name an environment variable".to_string());
        }
        Ok(())
    }

    /// `host:port` for binding the HTTP server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = FarumConfig::default();
        assert_eq!(config.mode, RunMode::Local);
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.history_window, 20);
        assert_eq!(config.request_timeout_secs, 120);
        assert!(config.journal_enabled);
        assert_eq!(config.llm.provider, ProviderType::Mock);
        assert_eq!(config.llm.max_tokens, 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: FarumConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 8080);
        assert!((config.llm.temperature - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_with_values() {
        let toml_str = r#"
mode = "hosted"
port = 9090
storage_backend = "sqlite"
history_window = 10
journal_enabled = false

[llm]
provider = "anthropic"
model = "claude-haiku"
"#;
        let config: FarumConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.mode, RunMode::Hosted);
        assert_eq!(config.port, 9090);
        assert_eq!(config.storage_backend, StorageBackend::Sqlite);
        assert_eq!(config.history_window, 10);
        assert!(!config.journal_enabled);
        assert_eq!(config.llm.provider, ProviderType::Anthropic);
        assert_eq!(config.llm.model, "claude-haiku");
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = FarumConfig {
            history_window: 0,
            ..FarumConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_hosted_needs_key_env_unless_mocked() {
        let mocked = FarumConfig {
            mode: RunMode::Hosted,
            ..FarumConfig::default()
        };
        assert!(mocked.validate().is_ok());

        let keyless = FarumConfig {
            mode: RunMode::Hosted,
            llm: LlmSettings {
                provider: ProviderType::Anthropic,
                api_key_env: "  ".to_string(),
                ..LlmSettings::default()
            },
            ..FarumConfig::default()
        };
        assert!(keyless.validate().unwrap_err().contains("api_key_env"));
    }

    #[test]
    fn test_bind_addr() {
        assert_eq!(FarumConfig::default().bind_addr(), "127.0.0.1:8080");
    }
}
