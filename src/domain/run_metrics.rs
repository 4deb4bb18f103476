use serde::{Deserialize, Serialize};

/// Measurements for one run: document extraction plus test case generation.
///
/// Durations are in seconds. Optional fields stay `None` until the matching
/// phase completes, and serialize as `null` so every history entry has the
/// same shape.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RunMetrics {
    pub run_id: Option<String>,
    /// RFC 3339 creation time.
    pub timestamp: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_size_bytes: Option<u64>,
    pub file_content_length: Option<usize>,
    /// sha256 of the extracted requirement text.
    pub input_digest: Option<String>,
    pub processing_time: Option<f64>,
    pub parsing_time: Option<f64>,
    pub ai_generation_time: Option<f64>,
    pub total_test_cases: Option<usize>,
    pub model_name: Option<String>,
    pub success: Option<bool>,
    pub error_message: Option<String>,
}

impl RunMetrics {
    pub fn is_successful(&self) -> bool {
        self.success == Some(true)
    }
}
