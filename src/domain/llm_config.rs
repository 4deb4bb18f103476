use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    #[default]
    Google,
    OpenRouter,
    Local,
}

impl LLMProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LLMProvider::Google => "google",
            LLMProvider::OpenRouter => "openrouter",
            LLMProvider::Local => "local",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::Google => GOOGLE_BASE_URL,
            LLMProvider::OpenRouter => OPENROUTER_BASE_URL,
            LLMProvider::Local => "http://localhost:1234/v1",
        }
    }

    /// Conventional environment variable holding this provider's key.
    pub fn key_env_var(&self) -> Option<&'static str> {
        match self {
            LLMProvider::Google => Some("GOOGLE_API_KEY"),
            LLMProvider::OpenRouter => Some("OPENROUTER_API_KEY"),
            LLMProvider::Local => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Local)
    }
}

impl fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LLMProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Ok(LLMProvider::Google),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "local" | "openai" => Ok(LLMProvider::Local),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Google,
            base_url: GOOGLE_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_tokens: Some(8192),
            temperature: Some(0.7),
        }
    }
}
