use crate::domain::error::{AppError, Result};
use serde::Serialize;
use std::path::Path;

mod parsers;

/// Requirement document formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Txt,
    Pdf,
    Docx,
    Doc,
}

impl DocumentKind {
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(DocumentKind::Txt),
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "doc" => Ok(DocumentKind::Doc),
            "" => Err(AppError::ExtractionError(format!(
                "File has no extension: {}",
                file_name
            ))),
            other => Err(AppError::ExtractionError(format!(
                "Unsupported file format: .{}",
                other
            ))),
        }
    }

    /// Extension with leading dot, as recorded in run metrics.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Txt => ".txt",
            DocumentKind::Pdf => ".pdf",
            DocumentKind::Docx => ".docx",
            DocumentKind::Doc => ".doc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub characters: usize,
    pub words: usize,
}

impl DocumentStats {
    pub fn of(text: &str) -> Self {
        Self {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
        }
    }
}

#[derive(Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Plain text of a requirement document. Blank documents are rejected.
    pub fn extract(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String> {
        let text = match kind {
            DocumentKind::Txt => self.parse_txt(bytes)?,
            DocumentKind::Pdf => self.parse_pdf(bytes)?,
            DocumentKind::Docx => self.parse_docx(bytes)?,
            DocumentKind::Doc => {
                tracing::warn!("legacy .doc upload; attempting to read it as .docx");
                self.parse_docx(bytes).map_err(|err| {
                    AppError::ExtractionError(format!(
                        "Legacy .doc files may not be supported, save the document as .docx ({})",
                        err
                    ))
                })?
            }
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::ExtractionError(
                "Document contains no extractable text".to_string(),
            ));
        }

        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(
            DocumentKind::from_file_name("Requirements.PDF").unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::from_file_name("requirements.docx").unwrap(),
            DocumentKind::Docx
        );
        assert!(matches!(
            DocumentKind::from_file_name("sheet.xlsx"),
            Err(AppError::ExtractionError(_))
        ));
        assert!(DocumentKind::from_file_name("README").is_err());
    }

    #[test]
    fn test_extract_txt_trims() {
        let text = DocumentExtractor::new()
            .extract(DocumentKind::Txt, b"  The user shall log in.\n\n")
            .unwrap();
        assert_eq!(text, "The user shall log in.");
    }

    #[test]
    fn test_blank_document_is_rejected() {
        let err = DocumentExtractor::new()
            .extract(DocumentKind::Txt, b" \n\t ")
            .unwrap_err();
        assert!(matches!(err, AppError::ExtractionError(_)));
    }

    #[test]
    fn test_invalid_utf8_txt_is_rejected() {
        let err = DocumentExtractor::new()
            .extract(DocumentKind::Txt, &[0xff, 0xfe, 0xfd])
            .unwrap_err();
        assert!(matches!(err, AppError::ExtractionError(_)));
    }

    #[test]
    fn test_garbage_pdf_and_doc_fail_cleanly() {
        let extractor = DocumentExtractor::new();
        assert!(matches!(
            extractor.extract(DocumentKind::Pdf, b"not a pdf"),
            Err(AppError::ExtractionError(_))
        ));
        assert!(matches!(
            extractor.extract(DocumentKind::Doc, b"\xd0\xcf\x11\xe0 legacy"),
            Err(AppError::ExtractionError(_))
        ));
    }

    #[test]
    fn test_document_stats() {
        let stats = DocumentStats::of("Kullanıcı giriş yapabilmeli.");
        assert_eq!(stats.words, 3);
        assert_eq!(stats.characters, 28);
    }
}
