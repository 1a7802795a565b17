//! The `aieval reset` command.

use std::path::PathBuf;

use anyhow::Result;

use aieval_core::table::ResultTable;

use super::load_session_config;

pub fn execute(config_path: Option<PathBuf>, session: Option<PathBuf>) -> Result<()> {
    let (_, session_path) = load_session_config(config_path.as_deref(), session)?;
    let removed = match ResultTable::load_or_new(&session_path) {
        Ok(table) => table.len(),
        Err(e) => {
            tracing::warn!(
                path = %session_path.display(),
                "discarding unreadable session: {e:#}"
            );
            0
        }
    };

    ResultTable::new().save_json(&session_path)?;

    println!("Session cleared ({removed} evaluation(s) removed).");
    Ok(())
}
