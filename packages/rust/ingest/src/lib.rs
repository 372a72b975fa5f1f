//! Tender document ingestion: uploaded PDFs → one Vault string.
//!
//! Each file's pages are extracted by a [`TextExtractor`], concatenated, and
//! prefixed with a `SOURCE DOCUMENT` header. Files keep their upload order.

mod pdf;

use std::path::Path;

use bidflow_shared::{BidFlowError, Document, Result, UploadedFile, Vault};
use tracing::{info, instrument};

pub use pdf::{PdfExtractor, is_pdf};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Turns one uploaded file into per-page text.
///
/// Pages without extractable text (scanned images) come back as empty strings.
pub trait TextExtractor: Send + Sync {
    /// Extract the text of every page, in page order.
    fn extract_pages(&self, file: &UploadedFile) -> Result<Vec<String>>;

    /// Human-readable extractor name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Ingestor
// ---------------------------------------------------------------------------

/// Builds a [`Vault`] from an upload batch.
pub struct Ingestor {
    extractor: Box<dyn TextExtractor>,
}

impl Ingestor {
    /// Create an ingestor around a specific extractor.
    pub fn new(extractor: impl TextExtractor + 'static) -> Self {
        Self {
            extractor: Box::new(extractor),
        }
    }

    /// Create an ingestor for PDF uploads.
    pub fn pdf() -> Self {
        Self::new(PdfExtractor)
    }

    /// Extract a single document. Page texts are joined without a separator.
    pub fn extract_document(&self, file: &UploadedFile) -> Result<Document> {
        let pages = self.extractor.extract_pages(file)?;
        let raw_text: String = pages.iter().filter(|p| !p.is_empty()).map(String::as_str).collect();

        Ok(Document {
            name: file.name.clone(),
            raw_text,
        })
    }

    /// Ingest an upload batch. The first unreadable file aborts the batch.
    #[instrument(skip_all, fields(files = files.len(), extractor = self.extractor.name()))]
    pub fn ingest(&self, files: &[UploadedFile]) -> Result<Vault> {
        if files.is_empty() {
            return Err(BidFlowError::validation("upload at least one PDF document"));
        }

        let documents = files
            .iter()
            .map(|f| self.extract_document(f))
            .collect::<Result<Vec<_>>>()?;

        let vault = Vault::from_documents(&documents);
        info!(
            documents = documents.len(),
            chars = vault.char_len(),
            fingerprint = %&vault.fingerprint()[..12],
            "vault synchronized"
        );
        Ok(vault)
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::pdf()
    }
}

/// Read files from disk into uploads, named after their file names.
pub fn load_uploads<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<UploadedFile>> {
    paths
        .iter()
        .map(|p| {
            let path = p.as_ref();
            let bytes = std::fs::read(path).map_err(|e| BidFlowError::io(path, e))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(UploadedFile::new(name, bytes))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Treats the bytes as UTF-8 text with `|` separating pages.
    struct PipeExtractor;

    impl TextExtractor for PipeExtractor {
        fn extract_pages(&self, file: &UploadedFile) -> Result<Vec<String>> {
            let text = String::from_utf8(file.bytes.clone())
                .map_err(|e| BidFlowError::document(&file.name, e.to_string()))?;
            if text.is_empty() {
                return Ok(vec![]);
            }
            Ok(text.split('|').map(String::from).collect())
        }

        fn name(&self) -> &str {
            "pipe"
        }
    }

    fn upload(name: &str, body: &str) -> UploadedFile {
        UploadedFile::new(name, body.as_bytes().to_vec())
    }

    #[test]
    fn single_page_scenario() {
        let ingestor = Ingestor::new(PipeExtractor);
        let vault = ingestor
            .ingest(&[upload("tender.pdf", "Clause 1: Insurance required, weight 20%")])
            .expect("ingest");
        assert_eq!(
            vault.text(),
            "\n--- SOURCE DOCUMENT: tender.pdf ---\nClause 1: Insurance required, weight 20%"
        );
    }

    #[test]
    fn one_header_per_file_in_upload_order() {
        let ingestor = Ingestor::new(PipeExtractor);
        let files = [upload("sow.pdf", "a|b"), upload("terms.pdf", "c"), upload("rfp.pdf", "d")];
        let vault = ingestor.ingest(&files).expect("ingest");

        assert_eq!(vault.text().matches("SOURCE DOCUMENT").count(), 3);
        let sow = vault.text().find("sow.pdf").expect("sow");
        let terms = vault.text().find("terms.pdf").expect("terms");
        let rfp = vault.text().find("rfp.pdf").expect("rfp");
        assert!(sow < terms && terms < rfp);
        assert!(vault.text().contains("---\nab\n"));
    }

    #[test]
    fn empty_pages_contribute_nothing() {
        let ingestor = Ingestor::new(PipeExtractor);
        let doc = ingestor.extract_document(&upload("scan.pdf", "intro||outro")).expect("doc");
        assert_eq!(doc.raw_text, "introoutro");
    }

    #[test]
    fn zero_page_file_still_gets_header() {
        let ingestor = Ingestor::new(PipeExtractor);
        let vault = ingestor.ingest(&[upload("blank.pdf", "")]).expect("ingest");
        assert_eq!(vault.text(), "\n--- SOURCE DOCUMENT: blank.pdf ---\n");
    }

    #[test]
    fn reingestion_is_byte_identical() {
        let ingestor = Ingestor::new(PipeExtractor);
        let files = [upload("a.pdf", "x|y"), upload("b.pdf", "z")];
        let first = ingestor.ingest(&files).expect("first");
        let second = ingestor.ingest(&files).expect("second");
        assert_eq!(first.text(), second.text());
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = Ingestor::new(PipeExtractor).ingest(&[]).unwrap_err();
        assert!(matches!(err, BidFlowError::Validation { .. }));
    }

    #[test]
    fn extraction_failure_aborts_batch() {
        let ingestor = Ingestor::new(PipeExtractor);
        let files = [upload("ok.pdf", "fine"), UploadedFile::new("bad.pdf", vec![0xff, 0xfe])];
        let err = ingestor.ingest(&files).unwrap_err();
        assert!(matches!(err, BidFlowError::Document { ref name, .. } if name == "bad.pdf"));
    }

    #[test]
    fn load_uploads_uses_file_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Statement of Work.pdf");
        std::fs::write(&path, b"%PDF-1.4").expect("write");

        let uploads = load_uploads(&[&path]).expect("load");
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].name, "Statement of Work.pdf");
        assert_eq!(uploads[0].bytes, b"%PDF-1.4");
    }

    #[test]
    fn pdf_pages_are_joined_under_one_header() {
        let bytes = std::fs::read("../../../fixtures/pdf/two-pages.pdf").expect("read pdf fixture");
        let vault = Ingestor::pdf()
            .ingest(&[UploadedFile::new("itt.pdf", bytes)])
            .expect("ingest");
        assert_eq!(
            vault.text(),
            "\n--- SOURCE DOCUMENT: itt.pdf ---\nPage one textPage two text"
        );
    }

    #[test]
    fn load_uploads_reports_missing_file() {
        let err = load_uploads(&["/nonexistent/bidflow/itt.pdf"]).unwrap_err();
        assert!(matches!(err, BidFlowError::Io { .. }));
    }
}
