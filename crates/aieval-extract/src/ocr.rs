//! OCR via the `tesseract` command-line tool.

use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use aieval_core::error::OcrError;
use aieval_core::traits::{ImageBlob, OcrEngine};

use crate::tool::run_tool;

/// Runs `tesseract <image> stdout` on each image.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    timeout: Duration,
    language: Option<String>,
}

impl TesseractOcr {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            language: None,
        }
    }

    /// Tesseract language code(s), e.g. `eng` or `eng+hin`.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    #[instrument(skip_all, fields(image = %image.name))]
    async fn ocr_text(&self, image: &ImageBlob) -> Result<String, OcrError> {
        let fail = |message: String| OcrError {
            image: image.name.clone(),
            message,
        };

        // Tesseract picks the decoder from the file contents, but keeping the
        // extension helps with formats it cannot sniff.
        let suffix = Path::new(&image.name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("aieval-ocr-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| fail(format!("failed to create temp file: {e}")))?;
        file.write_all(&image.data)
            .and_then(|_| file.flush())
            .map_err(|e| fail(format!("failed to write temp file: {e}")))?;

        let mut args = vec![file.path().as_os_str(), OsStr::new("stdout")];
        if let Some(language) = &self.language {
            args.push(OsStr::new("-l"));
            args.push(OsStr::new(language));
        }

        let stdout = run_tool("tesseract", args, self.timeout)
            .await
            .map_err(|e| fail(e.to_string()))?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}
