//! PDF text extraction backed by the `pdf-extract` crate.

use bidflow_shared::{BidFlowError, Result, UploadedFile};
use tracing::debug;

use crate::TextExtractor;

/// Leading bytes of every PDF file.
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Extracts per-page text from PDF uploads.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract_pages(&self, file: &UploadedFile) -> Result<Vec<String>> {
        if !is_pdf(&file.bytes) {
            return Err(BidFlowError::document(&file.name, "not a PDF file"));
        }

        // pdf-extract panics on some malformed inputs instead of returning an error.
        let bytes = file.bytes.as_slice();
        let pages: Vec<String> =
            std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
                .map_err(|_| BidFlowError::document(&file.name, "PDF parser aborted on malformed input"))?
                .map_err(|e| map_pdf_error(&file.name, e.to_string()))?
                .into_iter()
                .map(|page| page.trim().to_string())
                .collect();

        debug!(file = %file.name, pages = pages.len(), "extracted PDF text");
        Ok(pages)
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}

/// Whether the bytes carry the PDF signature.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}

fn map_pdf_error(name: &str, message: String) -> BidFlowError {
    let lower = message.to_lowercase();
    if lower.contains("password") || lower.contains("encrypted") {
        BidFlowError::document(name, format!("PDF is password protected: {message}"))
    } else {
        BidFlowError::document(name, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf_bytes() {
        let file = UploadedFile::new("notes.txt", b"plain text".to_vec());
        let err = PdfExtractor.extract_pages(&file).unwrap_err();
        assert!(matches!(err, BidFlowError::Document { ref name, .. } if name == "notes.txt"));
        assert!(err.to_string().contains("not a PDF"));
    }

    #[test]
    fn truncated_pdf_is_a_document_error() {
        let file = UploadedFile::new("broken.pdf", b"%PDF-1.7\n% truncated".to_vec());
        let err = PdfExtractor.extract_pages(&file).unwrap_err();
        assert!(matches!(err, BidFlowError::Document { .. }));
    }

    #[test]
    fn extracts_each_page_in_order() {
        let bytes = std::fs::read("../../../fixtures/pdf/two-pages.pdf").expect("read pdf fixture");
        let file = UploadedFile::new("two-pages.pdf", bytes);
        let pages = PdfExtractor.extract_pages(&file).expect("extract");
        assert_eq!(pages, vec!["Page one text", "Page two text"]);
    }

    #[test]
    fn signature_check() {
        assert!(is_pdf(b"%PDF-1.4 rest"));
        assert!(!is_pdf(b"PK\x03\x04"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn password_errors_are_labelled() {
        let err = map_pdf_error("sealed.pdf", "document is encrypted".into());
        assert!(err.to_string().contains("password protected"));
    }
}
