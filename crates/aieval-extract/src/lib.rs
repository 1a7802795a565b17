//! aieval-extract: Local document text extraction and OCR.
//!
//! Shells out to well-known tools instead of linking parsers:
//! `pdftotext` (poppler) for PDF, `unzip` for DOCX, `tesseract` for images.
//! Every invocation runs under a timeout.

pub mod docx;
pub mod ocr;
pub mod pdf;
pub mod tool;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use aieval_core::error::ExtractError;
use aieval_core::traits::{DocumentExtractor, DocumentFormat, ImageBlob};

pub use ocr::TesseractOcr;

/// [`DocumentExtractor`] backed by local command-line tools.
#[derive(Debug, Clone)]
pub struct LocalExtractor {
    timeout: Duration,
}

impl LocalExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl DocumentExtractor for LocalExtractor {
    #[instrument(skip_all, fields(path = %path.display()))]
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let format = DocumentFormat::from_path(path)?;
        tokio::fs::metadata(path).await?;

        let text = match format {
            DocumentFormat::Pdf => pdf::pdf_text(path, self.timeout).await?,
            DocumentFormat::Docx => docx::docx_text(path, self.timeout).await?,
        };
        tracing::debug!("extracted {} chars", text.len());
        Ok(text)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    async fn extract_embedded_images(&self, path: &Path) -> Result<Vec<ImageBlob>, ExtractError> {
        match DocumentFormat::from_path(path)? {
            DocumentFormat::Pdf => Ok(Vec::new()),
            DocumentFormat::Docx => docx::docx_images(path, self.timeout).await,
        }
    }
}
