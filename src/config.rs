use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Manuscript Auditor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default location of the guideline source files, relative to the working directory.
pub const DEFAULT_GUIDELINES_DIR: &str = "./guidelines";

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_CHAT_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "manuscript_auditor=info,warn"
}

/// Per-user data directory (~/.manuscript-auditor/), used for the default `.env` lookup.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".manuscript-auditor"))
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable(s): {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// Which generation/embedding service backs the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Ollama {
        base_url: String,
        chat_model: String,
        embedding_model: String,
    },
    Azure {
        endpoint: String,
        #[serde(skip_serializing)]
        api_key: String,
        api_version: String,
        chat_deployment: String,
        embedding_deployment: String,
    },
}

/// Tunables for chunking, retrieval and manuscript excerpting.
///
/// All budgets are measured in characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Prefix of the manuscript shown to the classifier.
    pub classifier_budget: usize,
    /// Tail of the manuscript used by discussion-oriented checks.
    pub terminal_budget: usize,
    /// Half-width of the window around the manuscript midpoint.
    pub centered_half_width: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            top_k: 5,
            classifier_budget: 3000,
            terminal_budget: 3000,
            centered_half_width: 2000,
        }
    }
}

/// Full runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditConfig {
    pub backend: BackendConfig,
    pub guidelines_dir: PathBuf,
    pub timeout_secs: u64,
    pub strict_build: bool,
    pub settings: PipelineSettings,
}

impl AuditConfig {
    /// Load configuration from the process environment.
    ///
    /// Reads `.env` from the working directory first, then from the app data
    /// directory. Existing environment variables are never overridden.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            if let Some(dir) = app_data_dir() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("AUDIT_BACKEND").as_deref().unwrap_or("ollama") {
            "ollama" => BackendConfig::Ollama {
                base_url: get("OLLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.into()),
                chat_model: get("OLLAMA_CHAT_MODEL")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_CHAT_MODEL.into()),
                embedding_model: get("OLLAMA_EMBEDDING_MODEL")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_EMBEDDING_MODEL.into()),
            },
            "azure" => {
                let keys = [
                    "AZURE_OPENAI_ENDPOINT",
                    "AZURE_OPENAI_API_KEY",
                    "AZURE_OPENAI_API_VERSION",
                    "AZURE_DEPLOYMENT_NAME",
                    "AZURE_EMBEDDING_DEPLOYMENT",
                ];
                let missing: Vec<&str> = keys.iter().copied().filter(|&k| get(k).is_none()).collect();
                if !missing.is_empty() {
                    return Err(ConfigError::Missing(missing.join(", ")));
                }
                let value = |k: &str| get(k).unwrap_or_default();
                BackendConfig::Azure {
                    endpoint: value("AZURE_OPENAI_ENDPOINT"),
                    api_key: value("AZURE_OPENAI_API_KEY"),
                    api_version: value("AZURE_OPENAI_API_VERSION"),
                    chat_deployment: value("AZURE_DEPLOYMENT_NAME"),
                    embedding_deployment: value("AZURE_EMBEDDING_DEPLOYMENT"),
                }
            }
            other => {
                return Err(ConfigError::Invalid {
                    key: "AUDIT_BACKEND".into(),
                    value: other.into(),
                })
            }
        };

        let defaults = PipelineSettings::default();
        let settings = PipelineSettings {
            chunk_size: parse_or(&get, "AUDIT_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_or(&get, "AUDIT_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: parse_or(&get, "AUDIT_TOP_K", defaults.top_k)?,
            ..defaults
        };

        if settings.chunk_size == 0 || settings.chunk_overlap >= settings.chunk_size {
            return Err(ConfigError::Invalid {
                key: "AUDIT_CHUNK_OVERLAP".into(),
                value: format!(
                    "overlap {} must be smaller than chunk size {}",
                    settings.chunk_overlap, settings.chunk_size
                ),
            });
        }
        if settings.top_k == 0 {
            return Err(ConfigError::Invalid {
                key: "AUDIT_TOP_K".into(),
                value: "0".into(),
            });
        }

        Ok(Self {
            backend,
            guidelines_dir: get("AUDIT_GUIDELINES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GUIDELINES_DIR)),
            timeout_secs: parse_or(&get, "AUDIT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            strict_build: parse_or(&get, "AUDIT_STRICT_BUILD", false)?,
            settings,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
