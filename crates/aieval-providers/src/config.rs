//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use aieval_core::engine::EngineConfig;
use aieval_core::scorer::ScoringPolicy;
use aieval_core::traits::LlmProvider;

use crate::gemini::GeminiProvider;
use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Mock {
        /// Answer every prompt with this text instead of the examiner defaults.
        #[serde(default)]
        fixed_response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Mock { fixed_response } => f
                .debug_struct("Mock")
                .field("fixed_response", fixed_response)
                .finish(),
        }
    }
}

/// Top-level aieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AievalConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature (0.0 for repeatable grading).
    #[serde(default)]
    pub default_temperature: f64,
    /// Points deducted from answers flagged as AI-generated.
    #[serde(default = "default_penalty")]
    pub penalty: f64,
    /// Answers with fewer words are not scored.
    #[serde(default = "default_min_answer_tokens")]
    pub min_answer_tokens: usize,
    /// Timeout for each examiner call, in seconds.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    /// Timeout for each external tool run (pdftotext, unzip, tesseract).
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
    /// Max questions scored concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Where the session's result table is persisted.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_penalty() -> f64 {
    5.0
}
fn default_min_answer_tokens() -> usize {
    10
}
fn default_call_timeout() -> u64 {
    60
}
fn default_tool_timeout() -> u64 {
    120
}
fn default_parallelism() -> usize {
    1
}
fn default_session_path() -> PathBuf {
    PathBuf::from("./aieval-session.json")
}

impl Default for AievalConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: 0.0,
            penalty: default_penalty(),
            min_answer_tokens: default_min_answer_tokens(),
            call_timeout_secs: default_call_timeout(),
            tool_timeout_secs: default_tool_timeout(),
            parallelism: default_parallelism(),
            session_path: default_session_path(),
        }
    }
}

impl AievalConfig {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            scoring: ScoringPolicy {
                penalty: self.penalty,
                min_answer_tokens: self.min_answer_tokens,
                call_timeout: Duration::from_secs(self.call_timeout_secs),
            },
            parallelism: self.parallelism.max(1),
        }
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
            org_id: org_id.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::Mock { fixed_response } => ProviderConfig::Mock {
            fixed_response: fixed_response.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `aieval.toml` in the current directory
/// 2. `~/.config/aieval/config.toml`
///
/// Environment variable overrides: `AIEVAL_GEMINI_KEY`, `AIEVAL_OPENAI_KEY`.
pub fn load_config() -> Result<AievalConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AievalConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("aieval.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AievalConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AievalConfig::default(),
    };

    apply_env_overrides(&mut config);

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn apply_env_overrides(config: &mut AievalConfig) {
    if let Ok(key) = std::env::var("AIEVAL_GEMINI_KEY") {
        let entry = config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::Gemini { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("AIEVAL_OPENAI_KEY") {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("aieval"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config {
        ProviderConfig::Gemini { api_key, base_url } => {
            if api_key.is_empty() {
                anyhow::bail!("gemini API key is empty (set AIEVAL_GEMINI_KEY)");
            }
            Arc::new(GeminiProvider::new(api_key, base_url.clone())?)
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Arc::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        )?),
        ProviderConfig::Mock { fixed_response } => match fixed_response {
            Some(response) => Arc::new(MockProvider::with_fixed_response(response)),
            None => Arc::new(MockProvider::examiner()),
        },
    };
    Ok(provider)
}

/// Look up a provider by name and create it.
///
/// `mock` is always available, even when not configured.
pub fn provider_by_name(config: &AievalConfig, name: &str) -> Result<Arc<dyn LlmProvider>> {
    match config.providers.get(name) {
        Some(provider_config) => create_provider(provider_config),
        None if name == "mock" => Ok(Arc::new(MockProvider::examiner())),
        None => anyhow::bail!(
            "provider '{name}' not configured. Add it to aieval.toml or set AIEVAL_{}_KEY",
            name.to_uppercase()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_AIEVAL_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_AIEVAL_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_AIEVAL_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("unterminated ${OOPS"), "unterminated ${OOPS");
        std::env::remove_var("_AIEVAL_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = AievalConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.default_model, "gemini-2.5-flash");
        assert_eq!(config.penalty, 5.0);
        assert_eq!(config.min_answer_tokens, 10);
        assert_eq!(config.parallelism, 1);
    }

    #[test]
    fn parse_provider_config() {
        let toml_str = r#"
default_provider = "openai"
default_model = "gpt-4.1-mini"
penalty = 3.5
parallelism = 4

[providers.gemini]
type = "gemini"
api_key = "g-test"

[providers.openai]
type = "openai"
api_key = "sk-openai"

[providers.mock]
type = "mock"
"#;
        let config: AievalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.penalty, 3.5);
        assert_eq!(config.call_timeout_secs, 60);
        assert!(matches!(
            config.providers.get("gemini"),
            Some(ProviderConfig::Gemini { .. })
        ));

        let engine = config.engine_config();
        assert_eq!(engine.parallelism, 4);
        assert_eq!(engine.scoring.penalty, 3.5);
    }

    #[test]
    fn debug_masks_api_keys() {
        let config = ProviderConfig::Gemini {
            api_key: "super-secret".into(),
            base_url: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/aieval.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aieval.toml");
        std::fs::write(&path, "min_answer_tokens = 3\nsession_path = \"s.json\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.min_answer_tokens, 3);
        assert_eq!(config.session_path, PathBuf::from("s.json"));
        assert_eq!(config.tool_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn mock_is_always_available() {
        let provider = provider_by_name(&AievalConfig::default(), "mock").unwrap();
        assert_eq!(provider.name(), "mock");
        assert!(provider_by_name(&AievalConfig::default(), "nope").is_err());
    }
}
