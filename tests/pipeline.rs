use std::sync::Arc;

use async_trait::async_trait;
use testcraft_lib::application::use_cases::history_stats::aggregate_history;
use testcraft_lib::application::{ComparisonUseCase, GenerationRequest, SessionContext, TestGenerationUseCase};
use testcraft_lib::domain::comparison::ComparisonRecord;
use testcraft_lib::domain::llm_config::LLMConfig;
use testcraft_lib::domain::run_metrics::RunMetrics;
use testcraft_lib::domain::test_case::TestCase;
use testcraft_lib::infrastructure::llm_clients::LLMClient;
use testcraft_lib::infrastructure::storage::JsonHistoryStore;
use testcraft_lib::{AppError, Result};

/// Replies with the next scripted answer on every call.
struct ScriptedModel {
    replies: std::sync::Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: std::sync::Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl LLMClient for ScriptedModel {
    async fn generate(&self, _config: &LLMConfig, _system: &str, _user: &str) -> Result<String> {
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| AppError::LLMError("no scripted reply left".to_string()))
    }

    async fn list_models(&self, _config: &LLMConfig) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

fn request(file_name: &str, text: &str) -> GenerationRequest {
    GenerationRequest {
        file_name: file_name.to_string(),
        bytes: text.as_bytes().to_vec(),
        config: LLMConfig::default(),
        language: "English".to_string(),
        save_metrics: true,
    }
}

const THREE_CASES: &str = r#"```json
[
  {"id": "TC001", "title": "Valid login", "precondition": "Account exists", "steps": "1. Open login\n2. Submit valid credentials", "expected_result": "Dashboard is shown"},
  {"id": "TC002", "title": "Wrong password", "precondition": "Account exists", "steps": "1. Submit a wrong password", "expected_result": "Error message"},
  {"id": "TC003", "title": "Empty form", "precondition": "", "steps": "1. Submit the empty form", "expected_result": "Validation errors"}
]
```"#;

#[tokio::test]
async fn generate_compare_and_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let metrics_store: Arc<JsonHistoryStore<RunMetrics>> =
        Arc::new(JsonHistoryStore::new(dir.path().join("metrics.json")));
    let comparison_store: Arc<JsonHistoryStore<ComparisonRecord>> =
        Arc::new(JsonHistoryStore::new(dir.path().join("comparisons.json")));

    let model = ScriptedModel::new(&[THREE_CASES, "Sorry, I can only answer in prose."]);
    let generation = TestGenerationUseCase::new(model, metrics_store.clone());
    let comparison = ComparisonUseCase::new(comparison_store);

    let requirement = "Users must log in with email and password. Three failures lock the account.";
    let outcome = generation
        .execute(request("login.txt", requirement))
        .await
        .unwrap();
    assert_eq!(outcome.test_cases.len(), 3);
    assert_eq!(outcome.evaluation.valid_structure, 3);
    assert_eq!(outcome.evaluation.has_prerequisites, 2);

    let mut session = SessionContext::new();
    session.record_generation(outcome.test_cases.clone(), outcome.requirement_text.clone());

    let manual: Vec<TestCase> = serde_json::from_value(serde_json::json!([
        {"id": "M1", "baslik": "Giriş", "on_kosul": "Hesap var", "adimlar": "Giriş yap", "beklenen_sonuc": "Panel açılır"},
        {"id": "M2", "baslik": "Hatalı şifre", "on_kosul": "Hesap var", "beklenen_sonuc": "Hata"}
    ]))
    .unwrap();
    let record = comparison
        .compare_with_session(&session, &manual, Some("login".to_string()), true)
        .unwrap();
    assert_eq!(record.differences.count_difference, 1);
    assert_eq!(record.differences.count_ratio, 1.5);
    assert_eq!(record.differences.count_percent_change, 50.0);
    assert_eq!(record.requirement_length, requirement.chars().count());

    let err = generation
        .execute(request("login.txt", requirement))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ResponseParseError { .. }));

    let history = metrics_store.load();
    assert_eq!(history.len(), 2);
    let summary = aggregate_history(&history).unwrap();
    assert_eq!(summary.total_runs, 2);
    assert_eq!(summary.successful_runs, 1);
    assert_eq!(summary.avg_test_cases, Some(3.0));
    assert_eq!(summary.total_test_cases_generated, 3);

    assert_eq!(comparison.history().len(), 1);
}
