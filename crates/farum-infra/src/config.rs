//! Configuration loader for Farum.
//!
//! Reads `config.toml` from the data directory (`~/.farum/` by default) and
//! deserializes it into [`FarumConfig`], falling back to defaults when the
//! file is missing or malformed. `FARUM_*` environment variables are then
//! applied on top.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use farum_types::config::{FarumConfig, LlmSettings, RunMode, StorageBackend};
use farum_types::llm::ProviderType;

use crate::sqlite::pool::default_database_url;

/// Resolve the data directory: `FARUM_DATA_DIR`, else `~/.farum`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FARUM_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".farum")
}

/// Load configuration from `{data_dir}/config.toml` plus the process
/// environment.
///
/// - If the file does not exist, starts from [`FarumConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and starts from
///   the default.
pub async fn load_config(data_dir: &Path) -> FarumConfig {
    let config = read_config_file(data_dir).await;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

async fn read_config_file(data_dir: &Path) -> FarumConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return FarumConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return FarumConfig::default();
        }
    };

    match toml::from_str::<FarumConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            FarumConfig::default()
        }
    }
}

/// Apply `FARUM_*` overrides read through `lookup`.
///
/// Unparseable values are logged and ignored.
pub fn apply_env_overrides<F>(mut config: FarumConfig, lookup: F) -> FarumConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(mode) = get("FARUM_MODE") {
        match mode.trim().to_lowercase().as_str() {
            // "gcp" is accepted for older deployments.
            "gcp" => config.mode = RunMode::Hosted,
            other => match other.parse::<RunMode>() {
                Ok(mode) => config.mode = mode,
                Err(e) => tracing::warn!("ignoring FARUM_MODE: {e}"),
            },
        }
    }
    if let Some(host) = get("FARUM_HOST") {
        config.host = host;
    }
    if let Some(port) = get("FARUM_PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.port = port,
            Err(e) => tracing::warn!("ignoring FARUM_PORT '{port}': {e}"),
        }
    }
    if let Some(backend) = get("FARUM_STORAGE_BACKEND") {
        match backend.parse::<StorageBackend>() {
            Ok(backend) => config.storage_backend = backend,
            Err(e) => tracing::warn!("ignoring FARUM_STORAGE_BACKEND: {e}"),
        }
    }
    if let Some(url) = get("FARUM_DATABASE_URL") {
        config.database_url = Some(url);
    }
    if let Some(model) = get("FARUM_MODEL_NAME") {
        config.llm.model = model;
    }
    if let Some(flag) = get("FARUM_USE_MOCK_LLM") {
        config.llm.provider = if parse_bool(&flag) {
            ProviderType::Mock
        } else {
            ProviderType::Anthropic
        };
    }

    config
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// The SQLite URL to use: the configured one or `{data_dir}/farum.db`.
pub fn database_url(config: &FarumConfig, data_dir: &Path) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}

/// Read the provider API key from the environment variable named in `settings`.
pub fn api_key_from_env(settings: &LlmSettings) -> Option<SecretString> {
    std::env::var(&settings.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
    }

    #[tokio::test]
    async fn valid_toml_is_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
port = 9000
storage_backend = "sqlite"
history_window = 8

[llm]
provider = "anthropic"
model = "claude-haiku"
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.port, 9000);
        assert_eq!(config.storage_backend, StorageBackend::Sqlite);
        assert_eq!(config.history_window, 8);
        assert_eq!(config.llm.provider, ProviderType::Anthropic);
    }

    #[tokio::test]
    async fn invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn env_overrides_apply() {
        let config = apply_env_overrides(
            FarumConfig::default(),
            env(&[
                ("FARUM_MODE", "gcp"),
                ("FARUM_PORT", "9191"),
                ("FARUM_HOST", "0.0.0.0"),
                ("FARUM_STORAGE_BACKEND", "sqlite"),
                ("FARUM_DATABASE_URL", "sqlite:///tmp/x.db"),
                ("FARUM_MODEL_NAME", "claude-haiku"),
                ("FARUM_USE_MOCK_LLM", "false"),
            ]),
        );

        assert_eq!(config.mode, RunMode::Hosted);
        assert_eq!(config.port, 9191);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.storage_backend, StorageBackend::Sqlite);
        assert_eq!(config.database_url.as_deref(), Some("sqlite:///tmp/x.db"));
        assert_eq!(config.llm.model, "claude-haiku");
        assert_eq!(config.llm.provider, ProviderType::Anthropic);
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let config = apply_env_overrides(
            FarumConfig::default(),
            env(&[("FARUM_PORT", "not-a-port"), ("FARUM_MODE", "cloud"), ("FARUM_HOST", "  ")]),
        );
        assert_eq!(config.port, 8080);
        assert_eq!(config.mode, RunMode::Local);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn mock_flag_forces_mock_provider() {
        let mut base = FarumConfig::default();
        base.llm.provider = ProviderType::Anthropic;
        let config = apply_env_overrides(base, env(&[("FARUM_USE_MOCK_LLM", "TRUE")]));
        assert_eq!(config.llm.provider, ProviderType::Mock);
    }

    #[test]
    fn database_url_defaults_into_data_dir() {
        let config = FarumConfig::default();
        let url = database_url(&config, Path::new("/data"));
        assert_eq!(url, "sqlite:///data/farum.db");
    }
}
