//! Core data model types for aieval.
//!
//! These are the types the whole pipeline passes around: segmented question
//! maps, per-question score records, and per-student evaluations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Answers of one document keyed by question identifier.
///
/// Identifiers keep the order in which they first appeared in the document.
/// Inserting an identifier that already exists replaces its answer but keeps
/// its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionMap {
    entries: Vec<(String, String)>,
}

impl QuestionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an answer, overwriting any earlier answer for the same identifier.
    pub fn insert(&mut self, id: impl Into<String>, answer: impl Into<String>) {
        let id = id.into();
        let answer = answer.into();
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(entry) => entry.1 = answer,
            None => self.entries.push((id, answer)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// `(identifier, answer)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Suspected authorship of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    LikelyAi,
    LikelyHuman,
    Uncertain,
    /// The detector failed or its answer could not be read.
    Unknown,
}

impl Verdict {
    /// The phrase the detector is asked to answer with.
    pub fn phrase(&self) -> &'static str {
        match self {
            Verdict::LikelyAi => "Likely AI-generated",
            Verdict::LikelyHuman => "Likely human-written",
            Verdict::Uncertain => "Uncertain",
            Verdict::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "likely_ai" | "likely ai-generated" | "ai" => Ok(Verdict::LikelyAi),
            "likely_human" | "likely human-written" | "human" => Ok(Verdict::LikelyHuman),
            "uncertain" => Ok(Verdict::Uncertain),
            "unknown" => Ok(Verdict::Unknown),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

/// Which collaborator call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Scoring,
    Detection,
}

/// What went wrong in a collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Provider,
    /// The call succeeded but the response did not follow the expected format.
    Malformed,
}

/// A typed degradation attached to a [`ScoreRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFailure {
    pub stage: FailureStage,
    pub kind: FailureKind,
    pub message: String,
}

/// The evaluation of one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Question identifier shared by the submission and the answer key.
    pub question_id: String,
    /// Score from the examiner, 0-10 with one decimal.
    pub raw_score: f64,
    /// Score after the AI penalty, never negative.
    pub adjusted_score: f64,
    pub verdict: Verdict,
    /// Examiner feedback, or an `[error]` marker when scoring failed.
    pub feedback: String,
    /// Justification given with the verdict.
    #[serde(default)]
    pub ai_reason: String,
    pub penalty_applied: bool,
    /// Degradations that happened while producing this record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ScoreFailure>,
}

impl ScoreRecord {
    /// Returns `true` if any collaborator call for this record failed.
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Column label used in tables and exports, e.g. `Q3`.
    pub fn label(&self) -> String {
        question_label(&self.question_id)
    }
}

/// Display label for a question identifier.
pub fn question_label(id: &str) -> String {
    format!("Q{id}")
}

/// All scored questions of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentEvaluation {
    pub id: Uuid,
    pub student_name: String,
    /// File name (or other label) of the evaluated submission.
    #[serde(default)]
    pub submission: String,
    pub evaluated_at: DateTime<Utc>,
    pub records: Vec<ScoreRecord>,
    /// Sum of adjusted scores, rounded to 2 decimals.
    pub total: f64,
    /// `Q<id>: <verdict>` pairs in record order, comma separated.
    pub remarks_summary: String,
}

impl StudentEvaluation {
    /// Build a finalized evaluation from the records of one run.
    pub fn accumulate(student_name: impl Into<String>, records: Vec<ScoreRecord>) -> Self {
        let total = round2(records.iter().map(|r| r.adjusted_score).sum());
        let remarks_summary = records
            .iter()
            .map(|r| format!("{}: {}", r.label(), r.verdict))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            id: Uuid::new_v4(),
            student_name: student_name.into(),
            submission: String::new(),
            evaluated_at: Utc::now(),
            records,
            total,
            remarks_summary,
        }
    }

    pub fn with_submission(mut self, submission: impl Into<String>) -> Self {
        self.submission = submission.into();
        self
    }

    pub fn record(&self, question_id: &str) -> Option<&ScoreRecord> {
        self.records.iter().find(|r| r.question_id == question_id)
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Format a score with at least one decimal (`9.0`, `10.5`, `7.25`).
pub fn format_score(value: f64) -> String {
    let plain = format!("{value}");
    if plain.contains('.') || !value.is_finite() {
        plain
    } else {
        format!("{value:.1}")
    }
}
