//! Collaborator trait definitions.
//!
//! The pipeline never talks to a model, a document parser or an OCR engine
//! directly. Those are reached through the traits below, implemented by the
//! `aieval-providers` and `aieval-extract` crates (and by stubs in tests).

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CollaboratorError, ExtractError, OcrError};

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that answer text prompts.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send a prompt and return the model's text answer.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;

    /// List available models for this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request sent to an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "gemini-2.5-flash").
    pub model: String,
    /// The main prompt.
    pub prompt: String,
    /// Optional system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from an LLM request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response text.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

// ---------------------------------------------------------------------------
// Examiner trait
// ---------------------------------------------------------------------------

/// The three judgement calls the pipeline needs from a language model.
///
/// Each method returns the examiner's raw text; interpretation is left to
/// [`crate::response`].
#[async_trait]
pub trait Examiner: Send + Sync {
    /// Ask for the student's full name. Expected format: `Name: <name>`.
    async fn extract_student_name(&self, text: &str) -> Result<String, CollaboratorError>;

    /// Grade an answer against the model answer.
    /// Expected format: `Score: X/10` then `Feedback: ...`.
    async fn score_answer(
        &self,
        question_id: &str,
        question_label: &str,
        model_answer: &str,
        student_answer: &str,
    ) -> Result<String, CollaboratorError>;

    /// Judge whether an answer reads as machine-written.
    /// Expected format: `Verdict: ...` then `Reason: ...`.
    async fn detect_ai(
        &self,
        answer: &str,
        question_label: &str,
    ) -> Result<String, CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Document collaborators
// ---------------------------------------------------------------------------

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .ok_or_else(|| ExtractError::UnsupportedFormat(path.display().to_string()))
    }

    /// Whether documents of this format can carry embedded images worth OCR-ing.
    pub fn has_embedded_images(&self) -> bool {
        matches!(self, DocumentFormat::Docx)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "pdf"),
            DocumentFormat::Docx => write!(f, "docx"),
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            other => Err(format!("unsupported format: {other}")),
        }
    }
}

/// An image embedded in a document.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    /// Name inside the document (e.g. `word/media/image1.png`).
    pub name: String,
    pub data: Vec<u8>,
}

/// Turns documents into plain text.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extract the document's text. Fails with `UnsupportedFormat` for
    /// anything that is not a PDF or DOCX file.
    async fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;

    /// Extract embedded images in document order.
    async fn extract_embedded_images(&self, path: &Path) -> Result<Vec<ImageBlob>, ExtractError>;
}

/// Reads text out of images.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn ocr_text(&self, image: &ImageBlob) -> Result<String, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("a/b/hw1.PDF")).unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("key.docx")).unwrap(),
            DocumentFormat::Docx
        );
    }

    #[test]
    fn unsupported_formats() {
        for name in ["notes.txt", "scan.png", "old.doc", "no_extension"] {
            let err = DocumentFormat::from_path(&PathBuf::from(name)).unwrap_err();
            assert!(matches!(err, ExtractError::UnsupportedFormat(_)), "{name}");
        }
    }

    #[test]
    fn only_docx_has_images() {
        assert!(DocumentFormat::Docx.has_embedded_images());
        assert!(!DocumentFormat::Pdf.has_embedded_images());
    }
}
