//! The `aieval export` command.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;

use aieval_core::table::ResultTable;
use aieval_report::write_html_report;

use super::load_session_config;

const DEFAULT_STEM: &str = "student_evaluations";

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Html,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }
}

pub fn execute(
    format: ExportFormat,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    session: Option<PathBuf>,
) -> Result<()> {
    let (_, session_path) = load_session_config(config_path.as_deref(), session)?;
    let table = ResultTable::load_or_new(&session_path)?;
    if table.is_empty() {
        eprintln!("Warning: the session has no evaluations; exporting an empty table.");
    }

    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("{DEFAULT_STEM}.{}", format.extension())));

    if output.as_os_str() == "-" {
        let bytes = match format {
            ExportFormat::Csv => table.export_csv(),
            ExportFormat::Json => serde_json::to_vec_pretty(&table)?,
            ExportFormat::Html => aieval_report::generate_html(&table).into_bytes(),
        };
        std::io::stdout()
            .write_all(&bytes)
            .context("failed to write to stdout")?;
        return Ok(());
    }

    match format {
        ExportFormat::Csv => table.save_csv(&output)?,
        ExportFormat::Json => table.save_json(&output)?,
        ExportFormat::Html => write_html_report(&table, &output)?,
    }
    eprintln!(
        "Exported {} evaluation(s) to {}",
        table.len(),
        output.display()
    );
    Ok(())
}
