use serde::{Deserialize, Serialize};

/// Mean character length of each content field across a batch.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct FieldLengths {
    #[serde(alias = "baslik")]
    pub title: f64,
    #[serde(alias = "on_kosul")]
    pub precondition: f64,
    #[serde(alias = "adimlar")]
    pub steps: f64,
    #[serde(alias = "beklenen_sonuc")]
    pub expected_result: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BatchSummary {
    pub count: usize,
    pub avg_fields_length: FieldLengths,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CountDifferences {
    /// Generated count minus reference count.
    pub count_difference: i64,
    pub count_ratio: f64,
    pub count_percent_change: f64,
}

/// Count-based coverage proxy. It says nothing about whether the two batches
/// exercise the same behaviour.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CoverageAnalysis {
    pub manual_coverage_estimate: u64,
    pub automated_coverage_estimate: u64,
    pub coverage_ratio: f64,
    pub efficiency_gain: f64,
}

/// Manual (reference) batch versus automated (generated) batch.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ComparisonRecord {
    pub comparison_name: String,
    pub timestamp: String,
    pub requirement_length: usize,
    pub manual: BatchSummary,
    pub automated: BatchSummary,
    pub differences: CountDifferences,
    pub coverage_analysis: CoverageAnalysis,
}
