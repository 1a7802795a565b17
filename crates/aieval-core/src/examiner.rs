//! [`Examiner`] implementation backed by any [`LlmProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::CollaboratorError;
use crate::traits::{Examiner, GenerateRequest, LlmProvider};

/// Characters of the submission shown to the model when looking for a name.
pub const NAME_CONTEXT_CHARS: usize = 1500;

const DEFAULT_MAX_TOKENS: u32 = 512;

/// Prompts an LLM with the examiner templates.
pub struct LlmExaminer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl LlmExaminer {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    async fn ask(&self, prompt: String) -> Result<String, CollaboratorError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt,
            system_prompt: None,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = self
            .provider
            .generate(&request)
            .await
            .map_err(CollaboratorError::from_anyhow)?;
        if response.content.trim().is_empty() {
            return Err(CollaboratorError::EmptyResponse);
        }
        Ok(response.content)
    }
}

#[async_trait]
impl Examiner for LlmExaminer {
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    async fn extract_student_name(&self, text: &str) -> Result<String, CollaboratorError> {
        self.ask(name_prompt(text)).await
    }

    #[instrument(skip(self, model_answer, student_answer), fields(provider = self.provider.name()))]
    async fn score_answer(
        &self,
        question_id: &str,
        question_label: &str,
        model_answer: &str,
        student_answer: &str,
    ) -> Result<String, CollaboratorError> {
        self.ask(score_prompt(
            question_id,
            question_label,
            model_answer,
            student_answer,
        ))
        .await
    }

    #[instrument(skip(self, answer), fields(provider = self.provider.name()))]
    async fn detect_ai(
        &self,
        answer: &str,
        question_label: &str,
    ) -> Result<String, CollaboratorError> {
        self.ask(detect_prompt(answer, question_label)).await
    }
}

/// First `NAME_CONTEXT_CHARS` characters of `text`.
pub fn name_context(text: &str) -> &str {
    match text.char_indices().nth(NAME_CONTEXT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn name_prompt(text: &str) -> String {
    format!(
        "You are an intelligent assistant helping extract student details.\n\
         From the following assignment submission content, extract only the **student's full name**. \
         If no clear name is found, respond with \"Anonymous\".\n\
         Text:\n{}\n\
         Respond in format:\n\
         Name: <full name or Anonymous>\n",
        name_context(text)
    )
}

pub fn score_prompt(
    question_id: &str,
    question_label: &str,
    model_answer: &str,
    student_answer: &str,
) -> String {
    format!(
        "You are an experienced university examiner evaluating technical assignment answers.\n\
         Assess the student's answer by comparing it to the model answer provided by the professor. \
         Be strict and deduct marks wherever the answer falls short.\n\
         Evaluation Criteria:\n\
         - Conceptual correctness\n\
         - Completeness\n\
         - Relevance\n\
         - Terminology and structure\n\
         ---\n\
         Question {question_id}: {question_label}\n\
         Model Answer:\n{model_answer}\n\
         Student Answer:\n{student_answer}\n\
         ---\n\
         Return only:\n\
         Score: X/10\n\
         Feedback: One clear, academic sentence justifying the score.\n"
    )
}

pub fn detect_prompt(answer: &str, question_label: &str) -> String {
    format!(
        "You are an AI text detection expert. Think carefully before you mark an answer \
         AI-generated or human-written.\n\
         Question: {question_label}\n\
         Answer:\n{answer}\n\
         Respond with one of the following:\n\
         - Likely AI-generated\n\
         - Likely human-written\n\
         - Uncertain\n\
         Also provide a short justification.\n\
         Format:\n\
         Verdict: <one of the above>\n\
         Reason: <brief explanation>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::traits::{GenerateResponse, ModelInfo, TokenUsage};
    use std::sync::Mutex;

    struct EchoProvider {
        reply: anyhow::Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl EchoProvider {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(vec![]),
            }
        }

        fn failing(err: ProviderError) -> Self {
            Self {
                reply: Err(err.into()),
                prompts: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            match &self.reply {
                Ok(content) => Ok(GenerateResponse {
                    content: content.clone(),
                    model: request.model.clone(),
                    token_usage: TokenUsage::default(),
                    latency_ms: 0,
                }),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }

        fn available_models(&self) -> Vec<ModelInfo> {
            vec![]
        }
    }

    #[tokio::test]
    async fn score_prompt_carries_answers() {
        let provider = Arc::new(EchoProvider::replying("Score: 7/10\nFeedback: fine"));
        let examiner = LlmExaminer::new(provider.clone(), "test-model");

        let out = examiner
            .score_answer("2", "Q2", "reference text", "student text")
            .await
            .unwrap();
        assert!(out.contains("Score: 7/10"));

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Question 2: Q2"));
        assert!(prompts[0].contains("reference text"));
        assert!(prompts[0].contains("student text"));
    }

    #[tokio::test]
    async fn empty_reply_is_an_error() {
        let examiner = LlmExaminer::new(Arc::new(EchoProvider::replying("  \n")), "m");
        let err = examiner.detect_ai("answer", "Q1").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::EmptyResponse));
    }

    #[tokio::test]
    async fn provider_failure_is_classified() {
        let examiner = LlmExaminer::new(
            Arc::new(EchoProvider::failing(ProviderError::NetworkError(
                "connection reset".into(),
            ))),
            "m",
        );
        let err = examiner.extract_student_name("text").await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn name_context_is_char_bounded() {
        let text = "é".repeat(NAME_CONTEXT_CHARS + 10);
        assert_eq!(name_context(&text).chars().count(), NAME_CONTEXT_CHARS);
        assert_eq!(name_context("short"), "short");
    }

    #[test]
    fn detect_prompt_lists_verdicts() {
        let prompt = detect_prompt("some answer", "Q4");
        assert!(prompt.contains("Likely AI-generated"));
        assert!(prompt.contains("Likely human-written"));
        assert!(prompt.contains("Question: Q4"));
    }
}
