//! Evaluation run orchestrator.
//!
//! Loads both documents, segments them, matches questions, scores every
//! scorable answer on a bounded worker pool and folds the records into one
//! [`StudentEvaluation`].

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::{ExtractError, OcrError};
use crate::matcher::missing_questions;
use crate::model::{question_label, ScoreRecord, StudentEvaluation};
use crate::response::parse_student_name;
use crate::scorer::{check_scorable, Scorer, ScoringPolicy, SkipReason};
use crate::segment::segment;
use crate::traits::{DocumentExtractor, DocumentFormat, Examiner, OcrEngine};

/// Name used when none can be found in a submission.
pub const ANONYMOUS: &str = "Anonymous";

/// Configuration for the evaluation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scoring: ScoringPolicy,
    /// Maximum questions scored at once. 1 scores strictly in order.
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringPolicy::default(),
            parallelism: 1,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_question_start(&self, question_id: &str);
    fn on_question_scored(&self, record: &ScoreRecord);
    fn on_question_skipped(&self, question_id: &str, reason: &SkipReason);
    fn on_run_complete(&self, scored: usize, skipped: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_question_start(&self, _: &str) {}
    fn on_question_scored(&self, _: &ScoreRecord) {}
    fn on_question_skipped(&self, _: &str, _: &SkipReason) {}
    fn on_run_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// Text of one uploaded document, including OCR of its embedded images.
#[derive(Debug, Clone, Default)]
pub struct DocumentText {
    pub text: String,
    /// OCR output per image that could be read, in document order.
    pub ocr_texts: Vec<String>,
    pub ocr_failures: Vec<OcrError>,
}

impl DocumentText {
    /// Body text followed by the OCR text of every image.
    pub fn combined(&self) -> String {
        if self.ocr_texts.is_empty() {
            return self.text.clone();
        }
        format!("{}\n{}", self.text, self.ocr_texts.join("\n"))
    }
}

/// A question that produced no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedQuestion {
    pub question_id: String,
    pub reason: SkipReason,
}

/// Everything one evaluation run produced.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub evaluation: StudentEvaluation,
    /// Answer-key questions the student did not attempt.
    pub missing: Vec<String>,
    pub skipped: Vec<SkippedQuestion>,
    pub ocr_failures: Vec<OcrError>,
}

/// Extract a document's text and OCR its embedded images.
///
/// An unsupported format or an unreadable document is fatal; a failed image
/// only loses that image's text.
pub async fn load_document(
    extractor: &dyn DocumentExtractor,
    ocr: &dyn OcrEngine,
    path: &Path,
) -> Result<DocumentText, ExtractError> {
    let format = DocumentFormat::from_path(path)?;
    let text = extractor.extract_text(path).await?;
    let mut document = DocumentText {
        text,
        ..Default::default()
    };

    if !format.has_embedded_images() {
        return Ok(document);
    }

    let images = match extractor.extract_embedded_images(path).await {
        Ok(images) => images,
        Err(e) => {
            tracing::warn!("could not extract images from {}: {e}", path.display());
            return Ok(document);
        }
    };

    for image in &images {
        match ocr.ocr_text(image).await {
            Ok(text) => document.ocr_texts.push(text),
            Err(e) => {
                tracing::warn!("{e}");
                document.ocr_failures.push(e);
            }
        }
    }
    tracing::debug!(
        "{}: {} image(s), {} OCR failure(s)",
        path.display(),
        images.len(),
        document.ocr_failures.len()
    );

    Ok(document)
}

/// The evaluation engine.
pub struct EvaluationEngine {
    examiner: Arc<dyn Examiner>,
    extractor: Arc<dyn DocumentExtractor>,
    ocr: Arc<dyn OcrEngine>,
    scorer: Scorer,
    config: EngineConfig,
}

impl EvaluationEngine {
    pub fn new(
        examiner: Arc<dyn Examiner>,
        extractor: Arc<dyn DocumentExtractor>,
        ocr: Arc<dyn OcrEngine>,
        config: EngineConfig,
    ) -> Self {
        let scorer = Scorer::new(Arc::clone(&examiner), config.scoring.clone());
        Self {
            examiner,
            extractor,
            ocr,
            scorer,
            config,
        }
    }

    /// Extract a document's text and OCR its embedded images.
    pub async fn load_document(&self, path: &Path) -> Result<DocumentText, ExtractError> {
        load_document(self.extractor.as_ref(), self.ocr.as_ref(), path).await
    }

    /// Evaluate a submission file against an answer-key file.
    pub async fn evaluate_files(
        &self,
        submission: &Path,
        answer_key: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<EvaluationOutcome, ExtractError> {
        let submission_doc = self.load_document(submission).await?;
        let key_doc = self.load_document(answer_key).await?;

        let label = submission
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| submission.display().to_string());

        let mut outcome = self
            .evaluate_texts(
                &label,
                &submission_doc.combined(),
                &key_doc.combined(),
                progress,
            )
            .await;
        outcome.ocr_failures = submission_doc
            .ocr_failures
            .into_iter()
            .chain(key_doc.ocr_failures)
            .collect();
        Ok(outcome)
    }

    /// Evaluate already-extracted texts.
    pub async fn evaluate_texts(
        &self,
        label: &str,
        submission_text: &str,
        key_text: &str,
        progress: &dyn ProgressReporter,
    ) -> EvaluationOutcome {
        let start = Instant::now();
        let answers = segment(submission_text);
        let model_answers = segment(key_text);
        tracing::info!(
            "{label}: {} answer(s) found, {} question(s) in key",
            answers.len(),
            model_answers.len()
        );

        let missing = missing_questions(&model_answers, &answers);
        if !missing.is_empty() {
            tracing::warn!("unattempted questions: {}", missing.join(", "));
        }

        let student_name = self.student_name(submission_text).await;

        let mut skipped = Vec::new();
        let mut jobs = Vec::new();
        for (index, (id, answer)) in answers.iter().enumerate() {
            let model_answer = model_answers.get(id);
            match check_scorable(answer, model_answer, self.config.scoring.min_answer_tokens) {
                Ok(()) => jobs.push((index, id, model_answer.unwrap_or_default(), answer)),
                Err(reason) => {
                    tracing::debug!("skipping Q{id}: {reason}");
                    progress.on_question_skipped(id, &reason);
                    skipped.push(SkippedQuestion {
                        question_id: id.to_string(),
                        reason,
                    });
                }
            }
        }

        let semaphore = Semaphore::new(self.config.parallelism.max(1));
        let mut futures = FuturesUnordered::new();
        for (index, id, model_answer, answer) in jobs {
            let semaphore = &semaphore;
            let scorer = &self.scorer;
            futures.push(async move {
                let _permit = semaphore.acquire().await;
                progress.on_question_start(id);
                let record = scorer
                    .evaluate(id, &question_label(id), model_answer, answer)
                    .await;
                (index, record)
            });
        }

        let mut scored = Vec::new();
        while let Some((index, record)) = futures.next().await {
            progress.on_question_scored(&record);
            scored.push((index, record));
        }
        scored.sort_by_key(|(index, _)| *index);
        let records: Vec<ScoreRecord> = scored.into_iter().map(|(_, r)| r).collect();

        progress.on_run_complete(records.len(), skipped.len(), start.elapsed());

        let evaluation = StudentEvaluation::accumulate(student_name, records).with_submission(label);
        tracing::info!(
            "{label}: {} scored, total {}",
            evaluation.records.len(),
            evaluation.total
        );

        EvaluationOutcome {
            evaluation,
            missing,
            skipped,
            ocr_failures: Vec::new(),
        }
    }

    /// Ask the examiner for the student's name, falling back to "Anonymous".
    async fn student_name(&self, text: &str) -> String {
        let timeout = self.config.scoring.call_timeout;
        match tokio::time::timeout(timeout, self.examiner.extract_student_name(text)).await {
            Ok(Ok(reply)) => parse_student_name(&reply).unwrap_or_else(|| ANONYMOUS.to_string()),
            Ok(Err(e)) => {
                tracing::warn!("name extraction failed: {e}");
                ANONYMOUS.to_string()
            }
            Err(_) => {
                tracing::warn!("name extraction timed out after {}s", timeout.as_secs());
                ANONYMOUS.to_string()
            }
        }
    }
}
