use serde::Serialize;
use std::time::Instant;

use crate::domain::run_metrics::RunMetrics;
use crate::domain::test_case::TestCase;

/// Where a run currently stands. Timers are independent, so this reflects the
/// most recent transition rather than a strict sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Parsing,
    Parsed,
    Generating,
    Generated,
    Finalized,
}

/// Phase timer for a single run.
///
/// Unmatched `end_*` calls are no-ops and leave the duration absent. Once
/// `end_processing` has run the record is frozen and every mutator is ignored.
pub struct RunMetricsRecorder {
    metrics: RunMetrics,
    phase: RunPhase,
    processing_start: Option<Instant>,
    parsing_start: Option<Instant>,
    ai_start: Option<Instant>,
}

impl RunMetricsRecorder {
    pub fn new() -> Self {
        Self {
            metrics: RunMetrics {
                run_id: Some(uuid::Uuid::new_v4().to_string()),
                timestamp: Some(chrono::Local::now().to_rfc3339()),
                ..Default::default()
            },
            phase: RunPhase::Idle,
            processing_start: None,
            parsing_start: None,
            ai_start: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn run_id(&self) -> &str {
        self.metrics.run_id.as_deref().unwrap_or_default()
    }

    pub fn is_finalized(&self) -> bool {
        self.phase == RunPhase::Finalized
    }

    pub fn start_processing(
        &mut self,
        file_name: &str,
        file_type: &str,
        file_size: u64,
        content_length: usize,
    ) {
        if self.is_finalized() {
            return;
        }
        if self.processing_start.is_some() {
            tracing::warn!(run_id = %self.run_id(), "start_processing called twice; ignoring");
            return;
        }

        self.processing_start = Some(Instant::now());
        self.metrics.file_name = Some(file_name.to_string());
        self.metrics.file_type = Some(file_type.to_string());
        self.metrics.file_size_bytes = Some(file_size);
        self.metrics.file_content_length = Some(content_length);
    }

    pub fn set_input_digest(&mut self, digest: String) {
        if !self.is_finalized() {
            self.metrics.input_digest = Some(digest);
        }
    }

    pub fn start_parsing(&mut self) {
        if self.is_finalized() {
            return;
        }
        self.parsing_start = Some(Instant::now());
        self.phase = RunPhase::Parsing;
    }

    pub fn end_parsing(&mut self) {
        if self.is_finalized() {
            return;
        }
        if let Some(start) = self.parsing_start.take() {
            self.metrics.parsing_time = Some(start.elapsed().as_secs_f64());
            self.phase = RunPhase::Parsed;
        }
    }

    pub fn start_ai_generation(&mut self, model_name: &str) {
        if self.is_finalized() {
            return;
        }
        self.ai_start = Some(Instant::now());
        self.metrics.model_name = Some(model_name.to_string());
        self.phase = RunPhase::Generating;
    }

    pub fn end_ai_generation(&mut self) {
        if self.is_finalized() {
            return;
        }
        if let Some(start) = self.ai_start.take() {
            self.metrics.ai_generation_time = Some(start.elapsed().as_secs_f64());
            self.phase = RunPhase::Generated;
        }
    }

    /// Finalize the run. `results` of `None` records zero test cases.
    pub fn end_processing(
        &mut self,
        results: Option<&[TestCase]>,
        success: bool,
        error_message: Option<String>,
    ) -> &RunMetrics {
        if self.is_finalized() {
            tracing::warn!(run_id = %self.run_id(), "run already finalized; ignoring end_processing");
            return &self.metrics;
        }

        if let Some(start) = self.processing_start {
            self.metrics.processing_time = Some(start.elapsed().as_secs_f64());
        }
        self.metrics.total_test_cases = Some(results.map(|cases| cases.len()).unwrap_or(0));
        self.metrics.success = Some(success);
        self.metrics.error_message = error_message;
        self.phase = RunPhase::Finalized;

        &self.metrics
    }
}

impl Default for RunMetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
