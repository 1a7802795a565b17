//! The session result table and its CSV export.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{format_score, question_label, StudentEvaluation};

/// Cell value for a question a student has no record for.
pub const NOT_APPLICABLE: &str = "N/A";

/// Evaluations accumulated during one session.
///
/// Created at session start, appended to after every run, and emptied only by
/// an explicit [`ResultTable::clear`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    evaluations: Vec<StudentEvaluation>,
}

impl Default for ResultTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultTable {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            evaluations: Vec::new(),
        }
    }

    pub fn push(&mut self, evaluation: StudentEvaluation) {
        self.evaluations.push(evaluation);
    }

    /// Drop every evaluation and start a new session.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn evaluations(&self) -> &[StudentEvaluation] {
        &self.evaluations
    }

    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }

    /// Every question identifier in the table, in order of first appearance.
    pub fn question_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for record in self.evaluations.iter().flat_map(|e| &e.records) {
            if !ids.contains(&record.question_id) {
                ids.push(record.question_id.clone());
            }
        }
        ids
    }

    /// Header row of the wide export.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["Student".to_string()];
        header.extend(self.question_ids().iter().map(|id| question_label(id)));
        header.push("Total".to_string());
        header.push("Remarks".to_string());
        header
    }

    /// One wide row per evaluation, aligned with [`ResultTable::header`].
    pub fn rows(&self) -> Vec<Vec<String>> {
        let ids = self.question_ids();
        self.evaluations
            .iter()
            .map(|eval| {
                let mut row = vec![eval.student_name.clone()];
                for id in &ids {
                    row.push(match eval.record(id) {
                        Some(r) => format!("{} ({})", format_score(r.adjusted_score), r.verdict),
                        None => NOT_APPLICABLE.to_string(),
                    });
                }
                row.push(format_score(eval.total));
                row.push(eval.remarks_summary.clone());
                row
            })
            .collect()
    }

    /// Render the table as CSV: `Student,Q<id>...,Total,Remarks`.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        write_csv_row(&mut csv, &self.header());
        for row in self.rows() {
            write_csv_row(&mut csv, &row);
        }
        csv
    }

    /// UTF-8 bytes of [`ResultTable::to_csv`].
    pub fn export_csv(&self) -> Vec<u8> {
        self.to_csv().into_bytes()
    }

    /// Write the CSV export to a file.
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.export_csv())
            .with_context(|| format!("failed to write CSV to {}", path.display()))?;
        Ok(())
    }

    /// Save the session as JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize session")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session to {}", path.display()))?;
        Ok(())
    }

    /// Load a session from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session from {}", path.display()))?;
        let table: ResultTable =
            serde_json::from_str(&content).context("failed to parse session JSON")?;
        Ok(table)
    }

    /// Load a session, or start a fresh one if the file does not exist yet.
    pub fn load_or_new(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_json(path)
        } else {
            Ok(Self::new())
        }
    }
}

fn write_csv_row(out: &mut String, fields: &[String]) {
    let line = fields
        .iter()
        .map(|f| csv_escape(f))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

/// Quote a CSV field if it contains a delimiter, quote or line break.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
