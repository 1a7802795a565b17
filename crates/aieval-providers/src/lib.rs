//! aieval-providers: LLM provider integrations.
//!
//! Implements the `LlmProvider` trait for Google Gemini and OpenAI-compatible
//! chat APIs, plus an offline mock, and loads the `aieval.toml` configuration.

pub mod config;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use aieval_core::error::ProviderError;
pub use config::{
    create_provider, load_config, load_config_from, provider_by_name, AievalConfig, ProviderConfig,
};
