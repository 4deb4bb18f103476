use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::Result;
use crate::domain::llm_config::{LLMConfig, LLMProvider, DEFAULT_MODEL};
use crate::infrastructure::security::keyring::KeyringManager;

pub const CONFIG_FILE: &str = "testcraft.toml";
pub const CONFIG_PATH_ENV: &str = "TESTCRAFT_CONFIG";
pub const ENV_PREFIX: &str = "TESTCRAFT_";
pub const KEYRING_SERVICE: &str = "testcraft";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub metrics_file: String,
    pub comparisons_file: String,
    pub save_metrics: bool,
    pub log_filter: String,
    /// Language the generated test cases are written in.
    pub language: String,
    pub llm: LlmSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LLMProvider,
    /// Falls back to the provider's public endpoint.
    pub base_url: Option<String>,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            metrics_file: "metrics.json".to_string(),
            comparisons_file: "comparisons.json".to_string(),
            save_metrics: true,
            log_filter: "testcraft_lib=info".to_string(),
            language: "English".to_string(),
            llm: LlmSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        let defaults = LLMConfig::default();
        Self {
            provider: defaults.provider,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout_secs: 120,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl AppConfig {
    /// Config file (if any) overlaid by `TESTCRAFT_*` environment variables.
    pub fn load() -> Result<Self> {
        let config: AppConfig = Self::figment().extract()?;
        Ok(config)
    }

    pub fn figment() -> Figment {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));

        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]))
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join(&self.metrics_file)
    }

    pub fn comparisons_path(&self) -> PathBuf {
        self.data_dir.join(&self.comparisons_file)
    }

    /// Model settings for `provider`, without a key. A provider other than
    /// the configured one gets its own default endpoint.
    pub fn llm_config(&self, provider: Option<LLMProvider>, model: Option<String>) -> LLMConfig {
        let provider = provider.unwrap_or(self.llm.provider);
        let base_url = match &self.llm.base_url {
            Some(url) if provider == self.llm.provider && !url.trim().is_empty() => url.clone(),
            _ => provider.default_base_url().to_string(),
        };

        LLMConfig {
            provider,
            base_url,
            model: model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.llm.model.clone()),
            api_key: None,
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
        }
    }
}

/// Provider API keys: configuration first, then the provider's conventional
/// environment variable, then the OS keyring.
pub struct ConfigService {
    keyring: KeyringManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new(KEYRING_SERVICE),
        }
    }

    pub fn save_api_key(&self, provider: LLMProvider, key: &str) -> Result<()> {
        self.keyring.set_secret(provider.as_str(), key)?;
        tracing::info!(provider = %provider, service = self.keyring.service(), "API key stored");
        Ok(())
    }

    pub fn get_api_key(&self, provider: LLMProvider) -> Result<Option<String>> {
        self.keyring.get_secret(provider.as_str())
    }

    pub fn delete_api_key(&self, provider: LLMProvider) -> Result<()> {
        self.keyring.delete_secret(provider.as_str())?;
        tracing::info!(provider = %provider, "API key deleted");
        Ok(())
    }

    /// Fill in `config.api_key`. A key that cannot be found is left `None`;
    /// the client reports it when the call is made.
    pub fn resolve_api_key(&self, settings: &LlmSettings, config: &mut LLMConfig) {
        if !config.provider.requires_api_key() {
            return;
        }

        let configured = settings
            .api_key
            .clone()
            .filter(|key| settings.provider == config.provider && !key.trim().is_empty());
        let from_env = || {
            config
                .provider
                .key_env_var()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.trim().is_empty())
        };

        config.api_key = configured.or_else(from_env).or_else(|| {
            match self.get_api_key(config.provider) {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!(provider = %config.provider, error = %e, "Keyring lookup failed");
                    None
                }
            }
        });

        if config.api_key.is_none() {
            tracing::debug!(provider = %config.provider, "No API key configured");
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_sources() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.metrics_path(), PathBuf::from("./metrics.json"));
            assert_eq!(config.server.port, 3001);
            assert_eq!(config.llm.provider, LLMProvider::Google);
            assert_eq!(config.llm.model, DEFAULT_MODEL);
            assert!(config.save_metrics);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                data_dir = "history"
                language = "Turkish"

                [llm]
                provider = "openrouter"
                model = "from-file"

                [server]
                port = 8080
                "#,
            )?;
            jail.set_env("TESTCRAFT_LLM__MODEL", "from-env");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.language, "Turkish");
            assert_eq!(config.llm.provider, LLMProvider::OpenRouter);
            assert_eq!(config.llm.model, "from-env");
            assert_eq!(config.server.port, 8080);
            assert_eq!(
                config.comparisons_path(),
                PathBuf::from("history").join("comparisons.json")
            );
            Ok(())
        });
    }

    #[test]
    fn test_config_path_override() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "save_metrics = false")?;
            jail.set_env(CONFIG_PATH_ENV, "custom.toml");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert!(!config.save_metrics);
            Ok(())
        });
    }

    #[test]
    fn test_default_log_filter_names_this_crate() {
        let filter = AppConfig::default().log_filter;
        let (target, level) = filter.split_once('=').unwrap();
        assert_eq!(level, "info");
        assert!(module_path!().starts_with(&format!("{}::", target)));
    }

    #[test]
    fn test_llm_config_switches_endpoint_with_provider() {
        let mut config = AppConfig::default();
        config.llm.base_url = Some("http://proxy.internal/v1beta".to_string());

        let google = config.llm_config(None, None);
        assert_eq!(google.base_url, "http://proxy.internal/v1beta");
        assert_eq!(google.model, DEFAULT_MODEL);

        let local = config.llm_config(Some(LLMProvider::Local), Some("qwen2.5".to_string()));
        assert_eq!(local.base_url, "http://localhost:1234/v1");
        assert_eq!(local.model, "qwen2.5");
        assert!(local.api_key.is_none());
    }

    #[test]
    fn test_configured_key_wins() {
        let mut settings = LlmSettings::default();
        settings.api_key = Some("from-config".to_string());
        let mut config = AppConfig::default().llm_config(None, None);

        ConfigService::new().resolve_api_key(&settings, &mut config);
        assert_eq!(config.api_key.as_deref(), Some("from-config"));
    }
}
