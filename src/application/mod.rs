pub mod use_cases;

pub use use_cases::comparison::ComparisonUseCase;
pub use use_cases::document_extraction::{DocumentExtractor, DocumentKind, DocumentStats};
pub use use_cases::evaluation::{evaluate_test_cases, EvaluationReport};
pub use use_cases::history_stats::{aggregate_history, HistorySummary};
pub use use_cases::run_recorder::RunMetricsRecorder;
pub use use_cases::session::SessionContext;
pub use use_cases::test_generation::{
    GenerationOutcome, GenerationRequest, TestGenerationUseCase,
};
