//! Mock provider for offline runs and tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use aieval_core::error::ProviderError;
use aieval_core::traits::{GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage};

/// A mock LLM provider that answers without any network access.
///
/// Responses are chosen by prompt substring; the first matching rule wins.
pub struct MockProvider {
    /// Ordered prompt substring → response rules.
    responses: Vec<(String, String)>,
    /// Response if no rule matches.
    default_response: String,
    /// When set, every call fails with an API error carrying this message.
    failure: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    /// Create a mock with the given prompt→response rules.
    pub fn new(responses: Vec<(String, String)>) -> Self {
        Self {
            responses,
            default_response: String::new(),
            failure: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.default_response = response.to_string();
        mock
    }

    /// A mock that answers the examiner prompts in the expected line format:
    /// a fixed name, `Score: 7/10` and a human-written verdict.
    pub fn examiner() -> Self {
        let mut mock = Self::new(vec![
            (
                "extract student details".to_string(),
                "Name: Mock Student".to_string(),
            ),
            (
                "university examiner".to_string(),
                "Score: 7/10\nFeedback: Covers the main points with minor gaps.".to_string(),
            ),
            (
                "AI text detection expert".to_string(),
                "Verdict: Likely human-written\nReason: Uneven phrasing and personal examples."
                    .to_string(),
            ),
        ]);
        mock.default_response = "Uncertain".to_string();
        mock
    }

    /// A mock whose every call fails.
    pub fn failing(message: &str) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.failure = Some(message.to_string());
        mock
    }

    /// Number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request made to this provider.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if let Some(message) = &self.failure {
            return Err(ProviderError::ApiError {
                status: 503,
                message: message.clone(),
            }
            .into());
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aieval_core::examiner::{detect_prompt, name_prompt, score_prompt};

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "mock-model".into(),
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("Score: 4/10");
        let response = provider.generate(&request("anything")).await.unwrap();
        assert_eq!(response.content, "Score: 4/10");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn examiner_mock_answers_each_prompt() {
        let provider = MockProvider::examiner();

        let name = provider
            .generate(&request(&name_prompt("Asha Rao\nQ1) ...")))
            .await
            .unwrap();
        assert_eq!(name.content, "Name: Mock Student");

        let score = provider
            .generate(&request(&score_prompt("1", "Q1", "key", "answer")))
            .await
            .unwrap();
        assert!(score.content.starts_with("Score: 7/10"));

        let verdict = provider
            .generate(&request(&detect_prompt("answer", "Q1")))
            .await
            .unwrap();
        assert!(verdict.content.starts_with("Verdict: Likely human-written"));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn failing_mock_returns_provider_error() {
        let provider = MockProvider::failing("quota exceeded");
        let err = provider.generate(&request("x")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::ApiError { status: 503, .. })
        ));
    }
}
