use serde::{Deserialize, Serialize};

use crate::application::use_cases::numeric::mean;
use crate::domain::run_metrics::RunMetrics;

/// Aggregates over the run history. Means cover successful runs only, and a
/// run without a given duration is left out of that duration's mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_runs: usize,
    pub successful_runs: usize,
    pub avg_processing_time: Option<f64>,
    pub avg_parsing_time: Option<f64>,
    pub avg_ai_generation_time: Option<f64>,
    pub avg_test_cases: Option<f64>,
    pub total_test_cases_generated: usize,
}

/// `None` for an empty history.
pub fn aggregate_history(history: &[RunMetrics]) -> Option<HistorySummary> {
    if history.is_empty() {
        return None;
    }

    let successful: Vec<&RunMetrics> = history.iter().filter(|m| m.is_successful()).collect();

    Some(HistorySummary {
        total_runs: history.len(),
        successful_runs: successful.len(),
        avg_processing_time: mean(successful.iter().filter_map(|m| m.processing_time)),
        avg_parsing_time: mean(successful.iter().filter_map(|m| m.parsing_time)),
        avg_ai_generation_time: mean(successful.iter().filter_map(|m| m.ai_generation_time)),
        avg_test_cases: mean(
            successful
                .iter()
                .filter_map(|m| m.total_test_cases)
                .map(|count| count as f64),
        ),
        total_test_cases_generated: successful.iter().filter_map(|m| m.total_test_cases).sum(),
    })
}

/// Successful runs in history order, for tabular display.
pub fn successful_runs(history: &[RunMetrics]) -> Vec<&RunMetrics> {
    history.iter().filter(|m| m.is_successful()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(success: bool, processing: f64, parsing: Option<f64>, cases: usize) -> RunMetrics {
        RunMetrics {
            success: Some(success),
            processing_time: Some(processing),
            parsing_time: parsing,
            total_test_cases: Some(cases),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(aggregate_history(&[]), None);
    }

    #[test]
    fn test_means_skip_failed_runs_and_missing_fields() {
        let history = vec![
            run(true, 2.0, Some(0.5), 4),
            run(false, 9.0, Some(7.0), 0),
            run(true, 4.0, None, 6),
        ];

        let summary = aggregate_history(&history).unwrap();
        assert_eq!(summary.total_runs, 3);
        assert_eq!(summary.successful_runs, 2);
        assert_eq!(summary.avg_processing_time, Some(3.0));
        // only one successful run carries parsing_time
        assert_eq!(summary.avg_parsing_time, Some(0.5));
        assert_eq!(summary.avg_ai_generation_time, None);
        assert_eq!(summary.avg_test_cases, Some(5.0));
        assert_eq!(summary.total_test_cases_generated, 10);
    }

    #[test]
    fn test_parsing_mean_uses_only_carrying_records() {
        let history = vec![
            run(true, 1.0, Some(0.2), 3),
            run(true, 1.0, Some(0.4), 3),
            run(false, 1.0, None, 0),
        ];

        let summary = aggregate_history(&history).unwrap();
        assert_eq!(summary.successful_runs, 2);
        let avg = summary.avg_parsing_time.unwrap();
        assert!((avg - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_unfinished_runs_are_not_successful() {
        let history = vec![RunMetrics::default()];
        let summary = aggregate_history(&history).unwrap();
        assert_eq!(summary.total_runs, 1);
        assert_eq!(summary.successful_runs, 0);
        assert_eq!(summary.avg_processing_time, None);
        assert!(successful_runs(&history).is_empty());
    }
}
