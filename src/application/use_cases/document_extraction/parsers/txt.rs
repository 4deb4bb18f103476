use super::super::{AppError, DocumentExtractor, Result};

impl DocumentExtractor {
    pub(in crate::application::use_cases::document_extraction) fn parse_txt(
        &self,
        bytes: &[u8],
    ) -> Result<String> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            tracing::error!(error = %e, "TXT upload is not valid UTF-8");
            AppError::ExtractionError(format!("TXT file is not valid UTF-8: {}", e))
        })?;

        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}
