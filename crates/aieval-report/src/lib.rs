//! aieval-report: Report generation for evaluation sessions.

pub mod html;

pub use html::{generate_html, write_html_report};
