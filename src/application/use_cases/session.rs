use crate::domain::error::{AppError, Result};
use crate::domain::test_case::TestCase;

/// Holds the most recent generated batch so a later comparison can use it.
///
/// A new generation replaces the previous batch wholesale.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    last_generated: Option<Vec<TestCase>>,
    requirement_text: String,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_generation(&mut self, test_cases: Vec<TestCase>, requirement_text: String) {
        self.last_generated = Some(test_cases);
        self.requirement_text = requirement_text;
    }

    pub fn last_generated(&self) -> Option<&[TestCase]> {
        self.last_generated.as_deref()
    }

    pub fn requirement_text(&self) -> &str {
        &self.requirement_text
    }

    /// Generated batch and requirement text, or a validation error when
    /// nothing usable has been generated yet.
    pub fn comparison_inputs(&self) -> Result<(&[TestCase], &str)> {
        match self.last_generated.as_deref() {
            Some(batch) if !batch.is_empty() => Ok((batch, &self.requirement_text)),
            Some(_) => Err(AppError::ValidationError(
                "The last generation produced no test cases to compare".to_string(),
            )),
            None => Err(AppError::ValidationError(
                "Generate test cases before running a comparison".to_string(),
            )),
        }
    }
}
