//! The `aieval init` command.

use std::path::Path;

use anyhow::Result;

const CONFIG_FILE: &str = "aieval.toml";

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
        return Ok(());
    }

    std::fs::write(CONFIG_FILE, SAMPLE_CONFIG)?;
    println!("Created {CONFIG_FILE}");

    println!("\nNext steps:");
    println!("  1. Set AIEVAL_GEMINI_KEY (or edit {CONFIG_FILE})");
    println!("  2. Run: aieval evaluate --key answer_key.pdf submission.docx");
    println!("  3. Run: aieval export --format csv");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# aieval configuration

default_provider = "gemini"
default_model = "gemini-2.5-flash"
default_temperature = 0.0

# Points deducted from answers flagged as AI-generated.
penalty = 5.0
# Answers shorter than this many words are not scored.
min_answer_tokens = 10

call_timeout_secs = 60
tool_timeout_secs = 120
parallelism = 1
session_path = "./aieval-session.json"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.mock]
type = "mock"
"#;
