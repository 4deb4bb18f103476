use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ExtractionError(String),
    ResponseParseError {
        message: String,
        raw_response: String,
    },
    LLMError(String),
    SecurityError(String),
    ConfigError(String),
    IoError(String),
}

impl AppError {
    /// Raw model output attached to a response parse failure, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AppError::ResponseParseError { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ExtractionError(msg) => write!(f, "Extraction error: {}", msg),
            AppError::ResponseParseError { message, .. } => {
                write!(f, "Model output is not valid JSON: {}", message)
            }
            AppError::LLMError(msg) => write!(f, "LLM error: {}", msg),
            AppError::SecurityError(msg) => write!(f, "Security error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
