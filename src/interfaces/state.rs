use std::sync::Arc;
use std::time::Duration;

use crate::application::use_cases::comparison::ComparisonUseCase;
use crate::application::use_cases::test_generation::TestGenerationUseCase;
use crate::domain::comparison::ComparisonRecord;
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use crate::domain::run_metrics::RunMetrics;
use crate::infrastructure::config::{AppConfig, ConfigService};
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};
use crate::infrastructure::storage::{ensure_data_dir, JsonHistoryStore};

/// Everything a CLI command or HTTP handler needs, built once from config.
pub struct AppState {
    pub config: AppConfig,
    pub config_service: ConfigService,
    pub llm_client: Arc<dyn LLMClient + Send + Sync>,
    pub metrics_store: Arc<JsonHistoryStore<RunMetrics>>,
    pub test_generation_use_case: TestGenerationUseCase,
    pub comparison_use_case: ComparisonUseCase,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(RouterClient::new(
            Duration::from_secs(config.llm.timeout_secs.max(1)),
        ));
        Self::with_client(config, llm_client)
    }

    pub fn with_client(config: AppConfig, llm_client: Arc<dyn LLMClient + Send + Sync>) -> Self {
        if let Err(e) = ensure_data_dir(&config.data_dir) {
            tracing::warn!(
                data_dir = %config.data_dir.display(),
                error = %e,
                "Could not create data directory"
            );
        }

        let metrics_store = Arc::new(JsonHistoryStore::new(config.metrics_path()));
        let comparison_store: Arc<JsonHistoryStore<ComparisonRecord>> =
            Arc::new(JsonHistoryStore::new(config.comparisons_path()));

        Self {
            test_generation_use_case: TestGenerationUseCase::new(
                llm_client.clone(),
                metrics_store.clone(),
            ),
            comparison_use_case: ComparisonUseCase::new(comparison_store),
            config_service: ConfigService::new(),
            llm_client,
            metrics_store,
            config,
        }
    }

    /// Model settings with the API key resolved.
    pub fn llm_config(&self, provider: Option<LLMProvider>, model: Option<String>) -> LLMConfig {
        let mut llm_config = self.config.llm_config(provider, model);
        self.config_service
            .resolve_api_key(&self.config.llm, &mut llm_config);
        llm_config
    }

    pub fn language_or_default(&self, language: Option<String>) -> String {
        language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| self.config.language.clone())
    }

    pub fn run_history(&self) -> Vec<RunMetrics> {
        self.metrics_store.load()
    }
}
