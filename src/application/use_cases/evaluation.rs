use serde::{Deserialize, Serialize};

use crate::application::use_cases::numeric::{percent_of, round2, safe_ratio};
use crate::domain::test_case::{text_len, TestCase};

/// Structural quality of a batch of test cases.
///
/// `coverage_score` is the plain mean of the four criterion percentages. It
/// measures how complete the records are, not how much of the requirement
/// they cover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub total_count: usize,
    /// Records carrying all five required keys, empty or not.
    pub valid_structure: usize,
    pub has_prerequisites: usize,
    pub has_steps: usize,
    pub has_expected_result: usize,
    /// Mean steps length over the whole batch; blank steps count as 0.
    pub avg_steps_length: f64,
    pub coverage_score: f64,
    pub valid_structure_percent: f64,
    pub has_prerequisites_percent: f64,
    pub has_steps_percent: f64,
    pub has_expected_result_percent: f64,
}

pub fn evaluate_test_cases(test_cases: &[TestCase]) -> EvaluationReport {
    if test_cases.is_empty() {
        return EvaluationReport::default();
    }

    let total = test_cases.len();
    let mut report = EvaluationReport {
        total_count: total,
        ..Default::default()
    };
    let mut total_steps_length = 0usize;

    for case in test_cases {
        if case.has_all_required_fields() {
            report.valid_structure += 1;
        }
        if case.has_precondition() {
            report.has_prerequisites += 1;
        }
        if case.has_steps() {
            report.has_steps += 1;
            total_steps_length += text_len(&case.steps);
        }
        if case.has_expected_result() {
            report.has_expected_result += 1;
        }
    }

    let valid_pct = percent_of(report.valid_structure, total);
    let prereq_pct = percent_of(report.has_prerequisites, total);
    let steps_pct = percent_of(report.has_steps, total);
    let expected_pct = percent_of(report.has_expected_result, total);

    report.avg_steps_length = round2(safe_ratio(total_steps_length as f64, total as f64));
    report.coverage_score = round2((valid_pct + prereq_pct + steps_pct + expected_pct) / 4.0);
    report.valid_structure_percent = round2(valid_pct);
    report.has_prerequisites_percent = round2(prereq_pct);
    report.has_steps_percent = round2(steps_pct);
    report.has_expected_result_percent = round2(expected_pct);

    report
}
