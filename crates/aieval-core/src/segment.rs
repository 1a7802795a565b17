//! Splitting a document's text into answers by question number.
//!
//! A question marker sits at the start of the text or of a line (optionally
//! indented), and looks like `Q1)`, `2.` or `13:`: an optional `Q`, one or two
//! digits, then `)`, `.` or `:`. Everything up to the next marker belongs to
//! that question. Text before the first marker is discarded.
//!
//! Identifiers are kept as written, so `01` and `1` are different questions.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::QuestionMap;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*Q?(\d{1,2})[).:]").expect("question marker regex is valid")
});

/// Segment `text` into a [`QuestionMap`].
///
/// Repeated identifiers overwrite earlier answers.
pub fn segment(text: &str) -> QuestionMap {
    let markers: Vec<(usize, usize, &str)> = MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(1)?;
            Some((whole.start(), whole.end(), id.as_str()))
        })
        .collect();

    let mut map = QuestionMap::new();
    for (i, (_, body_start, id)) in markers.iter().enumerate() {
        let body_end = markers
            .get(i + 1)
            .map(|(next_start, _, _)| *next_start)
            .unwrap_or(text.len());
        map.insert(*id, text[*body_start..body_end].trim());
    }

    if map.is_empty() && !text.trim().is_empty() {
        tracing::debug!("no question markers found in {} bytes of text", text.len());
    }

    map
}
