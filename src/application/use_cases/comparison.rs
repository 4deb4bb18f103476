use std::sync::Arc;

use crate::application::use_cases::field_lengths::average_field_lengths;
use crate::application::use_cases::numeric::{round2, safe_ratio};
use crate::application::use_cases::session::SessionContext;
use crate::domain::comparison::{
    BatchSummary, ComparisonRecord, CountDifferences, CoverageAnalysis,
};
use crate::domain::error::Result;
use crate::domain::test_case::TestCase;
use crate::infrastructure::storage::JsonHistoryStore;

/// Points credited per test case by the coverage estimate. An arbitrary
/// placeholder, not a calibrated weight.
pub const COVERAGE_POINTS_PER_CASE: u64 = 10;

/// Compare a reference (manual) batch against a generated (automated) one.
///
/// Every ratio with an empty reference batch is reported as 0.
pub fn compare_batches(
    manual: &[TestCase],
    automated: &[TestCase],
    requirement_text: &str,
    comparison_name: &str,
) -> ComparisonRecord {
    ComparisonRecord {
        comparison_name: comparison_name.to_string(),
        timestamp: chrono::Local::now().to_rfc3339(),
        requirement_length: requirement_text.chars().count(),
        manual: summarize(manual),
        automated: summarize(automated),
        differences: count_differences(manual.len(), automated.len()),
        coverage_analysis: analyze_coverage(manual.len(), automated.len()),
    }
}

/// Default label for a comparison made now.
pub fn default_comparison_name() -> String {
    format!("Comparison_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

pub struct ComparisonUseCase {
    store: Arc<JsonHistoryStore<ComparisonRecord>>,
}

impl ComparisonUseCase {
    pub fn new(store: Arc<JsonHistoryStore<ComparisonRecord>>) -> Self {
        Self { store }
    }

    /// Compare `manual` against the batch generated earlier in `session`.
    pub fn compare_with_session(
        &self,
        session: &SessionContext,
        manual: &[TestCase],
        name: Option<String>,
        save: bool,
    ) -> Result<ComparisonRecord> {
        let (generated, requirement_text) = session.comparison_inputs()?;
        Ok(self.compare(manual, generated, requirement_text, name, save))
    }

    pub fn compare(
        &self,
        manual: &[TestCase],
        generated: &[TestCase],
        requirement_text: &str,
        name: Option<String>,
        save: bool,
    ) -> ComparisonRecord {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(default_comparison_name);
        let record = compare_batches(manual, generated, requirement_text, &name);

        tracing::info!(
            comparison = %record.comparison_name,
            manual = record.manual.count,
            generated = record.automated.count,
            count_ratio = record.differences.count_ratio,
            "Comparison computed"
        );

        if save {
            if let Err(e) = self.store.append(&record) {
                tracing::warn!(
                    path = %self.store.path().display(),
                    error = %e,
                    "Failed to save comparison"
                );
            }
        }
        record
    }

    pub fn history(&self) -> Vec<ComparisonRecord> {
        self.store.load()
    }
}

fn summarize(test_cases: &[TestCase]) -> BatchSummary {
    BatchSummary {
        count: test_cases.len(),
        avg_fields_length: average_field_lengths(test_cases),
    }
}

fn count_differences(manual: usize, automated: usize) -> CountDifferences {
    let difference = automated as i64 - manual as i64;
    CountDifferences {
        count_difference: difference,
        count_ratio: round2(safe_ratio(automated as f64, manual as f64)),
        count_percent_change: round2(safe_ratio(difference as f64, manual as f64) * 100.0),
    }
}

// Count-based only: two batches of equal size score the same even if they
// test entirely different things.
fn analyze_coverage(manual: usize, automated: usize) -> CoverageAnalysis {
    let manual_estimate = manual as u64 * COVERAGE_POINTS_PER_CASE;
    let automated_estimate = automated as u64 * COVERAGE_POINTS_PER_CASE;
    let efficiency_gain = if manual == 0 {
        0.0
    } else {
        (automated as f64 / manual as f64 - 1.0) * 100.0
    };

    CoverageAnalysis {
        manual_coverage_estimate: manual_estimate,
        automated_coverage_estimate: automated_estimate,
        coverage_ratio: round2(safe_ratio(
            automated_estimate as f64,
            manual_estimate as f64,
        )),
        efficiency_gain: round2(efficiency_gain),
    }
}
