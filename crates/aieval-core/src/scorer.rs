//! Scoring one answer: examiner grade, AI detection, penalty.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CollaboratorError, ParseError};
use crate::model::{FailureKind, FailureStage, ScoreFailure, ScoreRecord, Verdict};
use crate::response::{parse_score_response, parse_verdict_response};
use crate::traits::Examiner;

/// Prefix of feedback and reasons produced in place of a failed call.
pub const ERROR_MARKER: &str = "[error]";

/// Scoring knobs.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    /// Points deducted on a `LikelyAi` verdict.
    pub penalty: f64,
    /// Answers with fewer whitespace-separated tokens are not scored.
    pub min_answer_tokens: usize,
    /// Upper bound for each examiner call.
    pub call_timeout: Duration,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            penalty: 5.0,
            min_answer_tokens: 10,
            call_timeout: Duration::from_secs(60),
        }
    }
}

/// Why a question produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The answer key has no (or an empty) answer for this identifier.
    NoModelAnswer,
    /// The student's answer is blank.
    EmptyAnswer,
    /// The student's answer has fewer tokens than required.
    TooShort { tokens: usize, required: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoModelAnswer => write!(f, "no model answer in key"),
            SkipReason::EmptyAnswer => write!(f, "empty answer"),
            SkipReason::TooShort { tokens, required } => {
                write!(f, "answer too short ({tokens} of {required} words)")
            }
        }
    }
}

/// Decide whether a question is scored at all.
pub fn check_scorable(
    student_answer: &str,
    model_answer: Option<&str>,
    min_answer_tokens: usize,
) -> Result<(), SkipReason> {
    if student_answer.trim().is_empty() {
        return Err(SkipReason::EmptyAnswer);
    }
    let tokens = student_answer.split_whitespace().count();
    if tokens < min_answer_tokens {
        return Err(SkipReason::TooShort {
            tokens,
            required: min_answer_tokens,
        });
    }
    match model_answer {
        Some(answer) if !answer.trim().is_empty() => Ok(()),
        _ => Err(SkipReason::NoModelAnswer),
    }
}

/// Apply the AI penalty. Returns the adjusted score and whether it was applied.
pub fn apply_penalty(raw_score: f64, verdict: Verdict, penalty: f64) -> (f64, bool) {
    if verdict == Verdict::LikelyAi && penalty > 0.0 {
        ((raw_score - penalty).max(0.0), true)
    } else {
        (raw_score, false)
    }
}

/// Grades answers through an [`Examiner`].
pub struct Scorer {
    examiner: Arc<dyn Examiner>,
    policy: ScoringPolicy,
}

impl Scorer {
    pub fn new(examiner: Arc<dyn Examiner>, policy: ScoringPolicy) -> Self {
        Self { examiner, policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score one answer. Never fails: a broken examiner call yields a degraded
    /// record (score 0 and/or verdict `Unknown`) with the failure attached.
    pub async fn evaluate(
        &self,
        question_id: &str,
        question_label: &str,
        model_answer: &str,
        student_answer: &str,
    ) -> ScoreRecord {
        let mut failures = Vec::new();

        let scoring = self
            .call(self.examiner.score_answer(
                question_id,
                question_label,
                model_answer,
                student_answer,
            ))
            .await;
        let (raw_score, mut feedback) = match scoring {
            Ok(text) => {
                let parsed = parse_score_response(&text);
                match parsed.score {
                    Ok(score) => (score, parsed.feedback),
                    Err(err) => {
                        tracing::warn!(question = question_id, "unreadable score: {err}");
                        let feedback = malformed_feedback(&err, &parsed.feedback);
                        failures.push(malformed(FailureStage::Scoring, &err));
                        (0.0, feedback)
                    }
                }
            }
            Err(err) => {
                tracing::warn!(question = question_id, "scoring failed: {err}");
                failures.push(failed(FailureStage::Scoring, &err));
                (0.0, format!("{ERROR_MARKER} scoring failed: {err}"))
            }
        };

        let detection = self
            .call(self.examiner.detect_ai(student_answer, question_label))
            .await;
        let (verdict, ai_reason) = match detection {
            Ok(text) => {
                let parsed = parse_verdict_response(&text);
                match parsed.verdict {
                    Ok(verdict) => (verdict, parsed.reason),
                    Err(err) => {
                        tracing::warn!(question = question_id, "unreadable verdict: {err}");
                        failures.push(malformed(FailureStage::Detection, &err));
                        (Verdict::Unknown, parsed.reason)
                    }
                }
            }
            Err(err) => {
                tracing::warn!(question = question_id, "AI detection failed: {err}");
                failures.push(failed(FailureStage::Detection, &err));
                (
                    Verdict::Unknown,
                    format!("{ERROR_MARKER} AI detection failed: {err}"),
                )
            }
        };

        let (adjusted_score, penalty_applied) =
            apply_penalty(raw_score, verdict, self.policy.penalty);
        if adjusted_score != raw_score {
            feedback.push_str(&format!(
                "\n(Note: -{} penalty applied due to AI-generated suspicion.)",
                self.policy.penalty
            ));
        }

        ScoreRecord {
            question_id: question_id.to_string(),
            raw_score,
            adjusted_score,
            verdict,
            feedback,
            ai_reason,
            penalty_applied,
            failures,
        }
    }

    async fn call<F>(&self, fut: F) -> Result<String, CollaboratorError>
    where
        F: Future<Output = Result<String, CollaboratorError>>,
    {
        match tokio::time::timeout(self.policy.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout(self.policy.call_timeout.as_secs())),
        }
    }
}

fn failed(stage: FailureStage, err: &CollaboratorError) -> ScoreFailure {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Provider
    };
    ScoreFailure {
        stage,
        kind,
        message: err.to_string(),
    }
}

fn malformed(stage: FailureStage, err: &ParseError) -> ScoreFailure {
    ScoreFailure {
        stage,
        kind: FailureKind::Malformed,
        message: err.to_string(),
    }
}

fn malformed_feedback(err: &ParseError, body: &str) -> String {
    if body.is_empty() {
        format!("{ERROR_MARKER} {err}")
    } else {
        format!("{ERROR_MARKER} {err}: {body}")
    }
}
