//! PDF text via poppler's `pdftotext`.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use aieval_core::error::ExtractError;

use crate::tool::run_tool;

/// Extract the text of every page, in page order, preserving layout.
pub async fn pdf_text(path: &Path, timeout: Duration) -> Result<String, ExtractError> {
    let args = [
        OsStr::new("-layout"),
        OsStr::new("-enc"),
        OsStr::new("UTF-8"),
        path.as_os_str(),
        OsStr::new("-"),
    ];
    let stdout = run_tool("pdftotext", args, timeout).await?;
    Ok(normalize_pages(&String::from_utf8_lossy(&stdout)))
}

/// pdftotext separates pages with form feeds; turn them into line breaks.
fn normalize_pages(text: &str) -> String {
    text.replace('\u{c}', "\n")
}
