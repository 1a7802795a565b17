//! The `aieval dashboard` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use aieval_core::model::format_score;
use aieval_core::statistics::summarize;
use aieval_core::table::ResultTable;

use super::load_session_config;

pub fn execute(config_path: Option<PathBuf>, session: Option<PathBuf>) -> Result<()> {
    let (_, session_path) = load_session_config(config_path.as_deref(), session)?;
    let table = ResultTable::load_or_new(&session_path)?;

    if table.is_empty() {
        println!("No submissions evaluated yet.");
        return Ok(());
    }

    let mut results = Table::new();
    results.set_header(table.header());
    for row in table.rows() {
        results.add_row(row);
    }
    println!("{results}");

    let summary = summarize(&table);
    println!(
        "\n{} student(s) | mean total {} | range {} - {}",
        summary.students,
        format_score(summary.mean_total),
        format_score(summary.min_total),
        format_score(summary.max_total)
    );
    println!(
        "{} answer(s) flagged as AI-generated, {} penalty(ies) applied, {} degraded record(s)",
        summary.flagged_answers, summary.penalties_applied, summary.degraded_records
    );

    let mut per_question = Table::new();
    per_question.set_header(vec!["Question", "Answered", "Avg score", "Flagged"]);
    for q in &summary.per_question {
        per_question.add_row(vec![
            Cell::new(format!("Q{}", q.question_id)),
            Cell::new(q.answered),
            Cell::new(format_score(q.avg_adjusted_score)),
            Cell::new(q.flagged),
        ]);
    }
    println!("\n{per_question}");

    Ok(())
}
