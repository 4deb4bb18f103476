use super::{api_error, endpoint, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde_json::json;

/// OpenAI-compatible chat completions, used for OpenRouter and for local
/// servers such as LM Studio or Ollama.
pub struct OpenRouterClient {
    client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn api_key(config: &LLMConfig) -> Result<Option<String>> {
        let key = config.api_key.clone().filter(|key| !key.trim().is_empty());
        if key.is_none() && config.provider.requires_api_key() {
            return Err(AppError::LLMError(format!(
                "Missing API key for {}; set {} or run `testcraft key set {} <KEY>`",
                config.provider,
                config.provider.key_env_var().unwrap_or("an API key"),
                config.provider
            )));
        }
        Ok(key)
    }

    fn request(&self, builder: reqwest::RequestBuilder, api_key: Option<String>) -> reqwest::RequestBuilder {
        let builder = builder.header("X-Title", "testcraft");
        match api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl LLMClient for OpenRouterClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let url = endpoint(&config.base_url, "chat/completions");

        let body = json!({
            "model": config.model,
            "messages": [
                {
                    "role": "system",
                    "content": system
                },
                {
                    "role": "user",
                    "content": user
                }
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        });

        let response = self
            .request(self.client.post(&url), api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::LLMError("Invalid response format".to_string()))
    }

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
        let api_key = Self::api_key(config)?;
        let url = endpoint(&config.base_url, "models");

        let response = self
            .request(self.client.get(&url), api_key)
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        let mut models: Vec<String> = json["data"]
            .as_array()
            .ok_or_else(|| {
                AppError::LLMError("Invalid response format: missing data array".to_string())
            })?
            .iter()
            .filter_map(|m| m["id"].as_str())
            .map(|id| id.to_string())
            .collect();
        models.sort();

        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm_config::LLMProvider;

    #[test]
    fn test_local_provider_needs_no_key() {
        let config = LLMConfig {
            provider: LLMProvider::Local,
            ..Default::default()
        };
        assert_eq!(OpenRouterClient::api_key(&config).unwrap(), None);
    }

    #[test]
    fn test_openrouter_requires_key() {
        let config = LLMConfig {
            provider: LLMProvider::OpenRouter,
            ..Default::default()
        };
        let err = OpenRouterClient::api_key(&config).unwrap_err();
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }
}
