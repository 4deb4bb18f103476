use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::application::use_cases::document_extraction::{
    DocumentExtractor, DocumentKind, DocumentStats,
};
use crate::application::use_cases::evaluation::{evaluate_test_cases, EvaluationReport};
use crate::application::use_cases::run_recorder::RunMetricsRecorder;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::run_metrics::RunMetrics;
use crate::domain::test_case::TestCase;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::storage::JsonHistoryStore;

mod hashing;
mod llm_output;
mod prompts;

use hashing::{digest_text, normalize_language};
use llm_output::decode_test_cases;
use prompts::{build_system_prompt, build_user_prompt};

pub struct GenerationRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub config: LLMConfig,
    pub language: String,
    pub save_metrics: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub test_cases: Vec<TestCase>,
    pub evaluation: EvaluationReport,
    pub metrics: RunMetrics,
    pub requirement_text: String,
    pub document: DocumentStats,
}

/// Requirement document in, evaluated test cases out. Every run, failed or
/// not, leaves one record in the metrics history.
pub struct TestGenerationUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    extractor: DocumentExtractor,
    metrics_store: Arc<JsonHistoryStore<RunMetrics>>,
}

impl TestGenerationUseCase {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        metrics_store: Arc<JsonHistoryStore<RunMetrics>>,
    ) -> Self {
        Self {
            llm_client,
            extractor: DocumentExtractor::new(),
            metrics_store,
        }
    }

    pub async fn execute(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
        let GenerationRequest {
            file_name,
            bytes,
            config,
            language,
            save_metrics,
        } = request;

        let mut recorder = RunMetricsRecorder::new();
        let file_size = bytes.len() as u64;
        let run_id = recorder.run_id().to_string();

        tracing::info!(run_id = %run_id, file_name = %file_name, file_size, "Starting test generation");

        recorder.start_parsing();
        let extracted = DocumentKind::from_file_name(&file_name)
            .and_then(|kind| self.extractor.extract(kind, &bytes));
        recorder.end_parsing();

        let requirement_text = match extracted {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(run_id = %run_id, file_name = %file_name, error = %err, "Document extraction failed");
                recorder.start_processing(&file_name, &declared_file_type(&file_name), file_size, 0);
                recorder.end_processing(None, false, Some(err.to_string()));
                self.persist(&recorder, save_metrics);
                return Err(err);
            }
        };

        let document = DocumentStats::of(&requirement_text);
        recorder.start_processing(
            &file_name,
            &declared_file_type(&file_name),
            file_size,
            requirement_text.chars().count(),
        );
        recorder.set_input_digest(digest_text(&requirement_text));

        let language = normalize_language(&language);
        let system_prompt = build_system_prompt(&language);
        let user_prompt = build_user_prompt(&requirement_text);

        recorder.start_ai_generation(&config.model);
        let generated = self
            .llm_client
            .generate(&config, &system_prompt, &user_prompt)
            .await;
        recorder.end_ai_generation();

        let raw_output = match generated {
            Ok(output) => output,
            Err(err) => {
                tracing::error!(run_id = %run_id, model = %config.model, error = %err, "Model call failed");
                recorder.end_processing(None, false, Some(err.to_string()));
                self.persist(&recorder, save_metrics);
                return Err(err);
            }
        };

        let test_cases = match decode_test_cases(&raw_output) {
            Ok(test_cases) => test_cases,
            Err(err) => {
                let message = match &err {
                    AppError::ResponseParseError { message, .. } => {
                        format!("JSON parse error: {}", message)
                    }
                    other => other.to_string(),
                };
                tracing::error!(run_id = %run_id, error = %message, "Model output could not be decoded");
                recorder.end_processing(None, false, Some(message));
                self.persist(&recorder, save_metrics);
                return Err(err);
            }
        };

        let metrics = recorder
            .end_processing(Some(&test_cases), true, None)
            .clone();
        self.persist(&recorder, save_metrics);

        let evaluation = evaluate_test_cases(&test_cases);

        tracing::info!(
            run_id = %run_id,
            test_cases = test_cases.len(),
            coverage_score = evaluation.coverage_score,
            processing_time = metrics.processing_time.unwrap_or_default(),
            "Test generation finished"
        );

        Ok(GenerationOutcome {
            test_cases,
            evaluation,
            metrics,
            requirement_text,
            document,
        })
    }

    fn persist(&self, recorder: &RunMetricsRecorder, save_metrics: bool) {
        if !save_metrics {
            return;
        }
        if let Err(e) = self.metrics_store.append(recorder.metrics()) {
            tracing::warn!(
                run_id = %recorder.run_id(),
                path = %self.metrics_store.path().display(),
                error = %e,
                "Failed to save run metrics"
            );
        }
    }
}

fn declared_file_type(file_name: &str) -> String {
    match DocumentKind::from_file_name(file_name) {
        Ok(kind) => kind.extension().to_string(),
        Err(_) => Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default(),
    }
}
