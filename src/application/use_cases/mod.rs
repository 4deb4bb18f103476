pub mod comparison;
pub mod document_extraction;
pub mod evaluation;
pub mod field_lengths;
pub mod history_stats;
pub mod numeric;
pub mod run_recorder;
pub mod session;
pub mod test_generation;
