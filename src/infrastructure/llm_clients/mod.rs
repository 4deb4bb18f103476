pub mod gemini;
pub mod openrouter;

use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::domain::llm_config::LLMProvider;
use async_trait::async_trait;
use gemini::GeminiClient;
use openrouter::OpenRouterClient;
use std::time::Duration;

#[async_trait]
pub trait LLMClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String>;
    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>>;
}

/// Dispatches on `config.provider`: Google goes to the Gemini API, anything
/// else to an OpenAI-compatible chat completions endpoint.
pub struct RouterClient {
    openrouter: OpenRouterClient,
    gemini: GeminiClient,
}

impl RouterClient {
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            openrouter: OpenRouterClient::new(http.clone()),
            gemini: GeminiClient::new(http),
        }
    }
}

#[async_trait]
impl LLMClient for RouterClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        tracing::debug!(provider = %config.provider, model = %config.model, "Calling model");
        match config.provider {
            LLMProvider::Google => self.gemini.generate(config, system, user).await,
            LLMProvider::OpenRouter | LLMProvider::Local => {
                self.openrouter.generate(config, system, user).await
            }
        }
    }

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
        match config.provider {
            LLMProvider::Google => self.gemini.list_models(config).await,
            LLMProvider::OpenRouter | LLMProvider::Local => {
                self.openrouter.list_models(config).await
            }
        }
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) async fn api_error(response: reqwest::Response) -> crate::domain::error::AppError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    crate::domain::error::AppError::LLMError(format!("API error ({}): {}", status, text.trim()))
}
