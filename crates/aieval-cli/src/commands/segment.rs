//! The `aieval segment` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use aieval_core::engine::load_document;
use aieval_core::model::question_label;
use aieval_core::segment::segment;
use aieval_extract::{LocalExtractor, TesseractOcr};
use aieval_providers::load_config_from;

const PREVIEW_CHARS: usize = 60;

pub async fn execute(
    file: PathBuf,
    plain: bool,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let text = if plain {
        std::fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?
    } else {
        let config = load_config_from(config_path.as_deref())?;
        let extractor = LocalExtractor::new(config.tool_timeout());
        let ocr = TesseractOcr::new(config.tool_timeout());
        let document = load_document(&extractor, &ocr, &file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?;
        for failure in &document.ocr_failures {
            eprintln!("Warning: {failure}");
        }
        document.combined()
    };

    let questions = segment(&text);

    if json {
        let entries: Vec<serde_json::Value> = questions
            .iter()
            .map(|(id, answer)| serde_json::json!({ "id": id, "answer": answer }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if questions.is_empty() {
        println!("No numbered answers found.");
        return Ok(());
    }

    println!("{} answer(s) found:", questions.len());
    for (id, answer) in questions.iter() {
        let words = answer.split_whitespace().count();
        let preview: String = answer
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(PREVIEW_CHARS)
            .collect();
        println!("  {} ({words} words): {preview}", question_label(id));
    }
    Ok(())
}
