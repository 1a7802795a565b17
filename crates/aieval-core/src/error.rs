//! Error taxonomy for the evaluation pipeline.
//!
//! Only `ExtractError::UnsupportedFormat` aborts a run. Every other error is
//! local to the smallest affected unit (one image, one question) and is
//! turned into a degraded value by the caller.

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
///
/// Defined here so the examiner can downcast a provider's `anyhow::Error`
/// and classify failures without string matching.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error will not go away by itself (bad key, bad model).
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }
}

/// Failure of one examiner call (scoring, AI detection or name extraction).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The call did not finish within the configured timeout.
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// The provider reported a classified failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider answered with no text.
    #[error("empty response")]
    EmptyResponse,

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl CollaboratorError {
    /// Classify a provider's `anyhow::Error`.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<ProviderError>() {
            Ok(ProviderError::Timeout(secs)) => CollaboratorError::Timeout(secs),
            Ok(provider) => CollaboratorError::Provider(provider),
            Err(other) => CollaboratorError::Other(format!("{other:#}")),
        }
    }

    /// Returns `true` if the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CollaboratorError::Timeout(_))
    }
}

/// Errors from turning a document into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file is neither a PDF nor a DOCX document.
    #[error("unsupported file type '{0}': please upload a .docx or .pdf")]
    UnsupportedFormat(String),

    /// An external extraction tool exited unsuccessfully or could not start.
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// An external extraction tool ran past its timeout.
    #[error("{tool} timed out after {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// OCR failure for a single image. Never aborts a batch.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("OCR failed for {image}: {message}")]
pub struct OcrError {
    /// Name of the image inside its document.
    pub image: String,
    pub message: String,
}

/// A collaborator response that does not follow the expected format.
///
/// Parse errors are never surfaced as failures of a run; the affected value is
/// treated as missing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("no 'Score: X/10' line in response")]
    MissingScore,

    #[error("score {0} is outside 0-10")]
    ScoreOutOfRange(f64),

    #[error("no 'Verdict:' line in response")]
    MissingVerdict,

    #[error("unrecognized verdict '{0}'")]
    UnrecognizedVerdict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_provider_timeout() {
        let err = anyhow::Error::new(ProviderError::Timeout(30));
        assert!(CollaboratorError::from_anyhow(err).is_timeout());
    }

    #[test]
    fn classify_provider_error() {
        let err = anyhow::Error::new(ProviderError::AuthenticationFailed("bad key".into()));
        match CollaboratorError::from_anyhow(err) {
            CollaboratorError::Provider(p) => assert!(p.is_permanent()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn classify_unknown_error() {
        let err = anyhow::anyhow!("socket closed");
        let classified = CollaboratorError::from_anyhow(err);
        assert!(matches!(classified, CollaboratorError::Other(_)));
        assert_eq!(classified.to_string(), "socket closed");
    }

    #[test]
    fn unsupported_format_message() {
        let err = ExtractError::UnsupportedFormat("notes.txt".into());
        assert!(err.to_string().contains(".docx or .pdf"));
    }
}
