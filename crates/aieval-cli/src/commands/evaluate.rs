//! The `aieval evaluate` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use aieval_core::engine::{EvaluationEngine, EvaluationOutcome, ProgressReporter};
use aieval_core::error::OcrError;
use aieval_core::examiner::LlmExaminer;
use aieval_core::model::{format_score, ScoreRecord};
use aieval_core::scorer::SkipReason;
use aieval_core::table::ResultTable;
use aieval_extract::{LocalExtractor, TesseractOcr};
use aieval_providers::provider_by_name;

use super::load_session_config;

#[derive(Args)]
pub struct EvaluateArgs {
    /// Student submissions (.pdf or .docx)
    #[arg(required = true)]
    submissions: Vec<PathBuf>,

    /// Answer key with the model answers (.pdf or .docx)
    #[arg(long)]
    key: PathBuf,

    /// Provider name from the config (e.g. gemini, openai, mock)
    #[arg(long)]
    provider: Option<String>,

    /// Model to use for scoring and detection
    #[arg(long)]
    model: Option<String>,

    /// Points deducted from answers flagged as AI-generated
    #[arg(long)]
    penalty: Option<f64>,

    /// Minimum words for an answer to be scored
    #[arg(long)]
    min_tokens: Option<usize>,

    /// Max questions scored concurrently
    #[arg(long)]
    parallelism: Option<usize>,

    /// Generation temperature
    #[arg(long)]
    temperature: Option<f64>,

    /// OCR language passed to tesseract (e.g. eng)
    #[arg(long)]
    ocr_lang: Option<String>,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_question_start(&self, question_id: &str) {
        eprintln!("  Scoring: Q{question_id}");
    }

    fn on_question_scored(&self, record: &ScoreRecord) {
        let degraded = if record.is_degraded() {
            " (degraded)"
        } else {
            ""
        };
        eprintln!(
            "  Done: {} {} [{}]{}",
            record.label(),
            format_score(record.adjusted_score),
            record.verdict,
            degraded
        );
    }

    fn on_question_skipped(&self, question_id: &str, reason: &SkipReason) {
        eprintln!("  Skipped: Q{question_id}: {reason}");
    }

    fn on_run_complete(&self, scored: usize, skipped: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {scored} scored, {skipped} skipped ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    args: EvaluateArgs,
    config_path: Option<PathBuf>,
    session: Option<PathBuf>,
) -> Result<()> {
    let (mut config, session_path) = load_session_config(config_path.as_deref(), session)?;

    if let Some(penalty) = args.penalty {
        anyhow::ensure!(
            (0.0..=10.0).contains(&penalty),
            "penalty must be between 0 and 10"
        );
        config.penalty = penalty;
    }
    if let Some(min_tokens) = args.min_tokens {
        config.min_answer_tokens = min_tokens;
    }
    if let Some(parallelism) = args.parallelism {
        anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
        config.parallelism = parallelism;
    }
    if let Some(temperature) = args.temperature {
        anyhow::ensure!(
            (0.0..=2.0).contains(&temperature),
            "temperature must be between 0.0 and 2.0"
        );
        config.default_temperature = temperature;
    }

    let provider_name = args
        .provider
        .unwrap_or_else(|| config.default_provider.clone());
    let provider = provider_by_name(&config, &provider_name)?;
    let model = match args.model {
        Some(model) => model,
        None if provider_name == config.default_provider => config.default_model.clone(),
        None => provider
            .available_models()
            .first()
            .map(|m| m.id.clone())
            .unwrap_or_else(|| config.default_model.clone()),
    };

    let examiner = LlmExaminer::new(provider, &model).with_temperature(config.default_temperature);
    let mut ocr = TesseractOcr::new(config.tool_timeout());
    if let Some(lang) = args.ocr_lang {
        ocr = ocr.with_language(lang);
    }
    let engine = EvaluationEngine::new(
        Arc::new(examiner),
        Arc::new(LocalExtractor::new(config.tool_timeout())),
        Arc::new(ocr),
        config.engine_config(),
    );

    let mut table = ResultTable::load_or_new(&session_path)?;

    eprintln!(
        "aieval v{} - evaluating {} submission(s) with {provider_name}/{model}",
        env!("CARGO_PKG_VERSION"),
        args.submissions.len()
    );

    let key = engine
        .load_document(&args.key)
        .await
        .with_context(|| format!("failed to read answer key {}", args.key.display()))?;
    print_ocr_failures(&args.key, &key.ocr_failures);
    let key_text = key.combined();

    for submission in &args.submissions {
        let document = engine
            .load_document(submission)
            .await
            .with_context(|| format!("failed to read submission {}", submission.display()))?;
        print_ocr_failures(submission, &document.ocr_failures);

        eprintln!("\n{}", submission.display());
        let outcome = engine
            .evaluate_texts(
                &file_label(submission),
                &document.combined(),
                &key_text,
                &ConsoleReporter,
            )
            .await;
        print_outcome(&outcome);

        table.push(outcome.evaluation);
        table.save_json(&session_path)?;
    }

    eprintln!(
        "\nSession saved to {} ({} submission(s))",
        session_path.display(),
        table.len()
    );
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_ocr_failures(path: &Path, failures: &[OcrError]) {
    for failure in failures {
        eprintln!("Warning: {}: {failure}", path.display());
    }
}

fn print_outcome(outcome: &EvaluationOutcome) {
    use comfy_table::{Cell, Table};

    let eval = &outcome.evaluation;
    println!("\nStudent: {}", eval.student_name);

    if !outcome.missing.is_empty() {
        println!(
            "Missing answers for questions: {}",
            outcome
                .missing
                .iter()
                .map(|id| format!("Q{id}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if eval.records.is_empty() {
        println!("No answers could be scored.");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Question", "Score", "Adjusted", "Verdict", "Feedback"]);
        for r in &eval.records {
            table.add_row(vec![
                Cell::new(r.label()),
                Cell::new(format_score(r.raw_score)),
                Cell::new(format_score(r.adjusted_score)),
                Cell::new(r.verdict.phrase()),
                Cell::new(&r.feedback),
            ]);
        }
        println!("{table}");
    }

    for skipped in &outcome.skipped {
        println!("Skipped Q{}: {}", skipped.question_id, skipped.reason);
    }
    println!("Total: {}", format_score(eval.total));
}
