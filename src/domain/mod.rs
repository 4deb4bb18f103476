pub mod comparison;
pub mod error;
pub mod llm_config;
pub mod run_metrics;
pub mod test_case;
