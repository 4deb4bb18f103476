use super::super::{AppError, DocumentExtractor, Result};

impl DocumentExtractor {
    pub(in crate::application::use_cases::document_extraction) fn parse_pdf(
        &self,
        bytes: &[u8],
    ) -> Result<String> {
        use lopdf::Document;

        let document = Document::load_mem(bytes)
            .map_err(|e| AppError::ExtractionError(format!("Failed to load PDF: {}", e)))?;

        let mut pages: Vec<String> = Vec::new();
        let mut total_pages = 0usize;

        // unreadable pages are skipped, not fatal
        for page_num in document.get_pages().keys() {
            total_pages += 1;
            match document.extract_text(&[*page_num]) {
                Ok(page_text) => {
                    let trimmed = page_text.trim();
                    if !trimmed.is_empty() {
                        pages.push(trimmed.to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(page = page_num, error = %e, "Skipping unreadable PDF page");
                }
            }
        }

        if pages.is_empty() && total_pages > 0 {
            tracing::warn!(
                total_pages,
                "PDF has no text layer; scanned documents are not supported"
            );
        }

        Ok(pages.join("\n\n"))
    }
}
