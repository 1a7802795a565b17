pub mod dashboard;
pub mod evaluate;
pub mod export;
pub mod init;
pub mod list_models;
pub mod reset;
pub mod segment;

use std::path::{Path, PathBuf};

use anyhow::Result;

use aieval_providers::{load_config_from, AievalConfig};

/// Load the config and resolve the session file path.
pub fn load_session_config(
    config_path: Option<&Path>,
    session: Option<PathBuf>,
) -> Result<(AievalConfig, PathBuf)> {
    let config = load_config_from(config_path)?;
    let session_path = session.unwrap_or_else(|| config.session_path.clone());
    Ok((config, session_path))
}
