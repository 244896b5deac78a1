pub mod types;
pub mod ollama;
pub mod azure;
pub mod mock;

pub use types::*;
pub use ollama::*;
pub use azure::*;
pub use mock::*;

use std::sync::Arc;

use thiserror::Error;

use crate::config::{AuditConfig, BackendConfig};
use crate::pipeline::storage::{EmbeddingModel, StorageError};

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Backend configuration error: {0}")]
    Configuration(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend returned error (status {status}): {body}")]
    Backend { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

impl From<LlmError> for StorageError {
    fn from(err: LlmError) -> Self {
        StorageError::Embedding(err.to_string())
    }
}

/// Generation and embedding backends selected by `config`.
pub struct Backends {
    pub generator: Arc<dyn LlmGenerate>,
    pub embedder: Arc<dyn EmbeddingModel>,
}

/// Construct the configured backends. Fails only on construction problems;
/// reachability is discovered on first use.
pub fn backends_from_config(config: &AuditConfig) -> Result<Backends, LlmError> {
    match &config.backend {
        BackendConfig::Ollama {
            base_url,
            chat_model,
            embedding_model,
        } => {
            let client = Arc::new(OllamaClient::new(
                base_url,
                chat_model,
                embedding_model,
                config.timeout_secs,
            )?);
            tracing::info!(base_url = %base_url, model = %chat_model, "Using Ollama backend");
            Ok(Backends {
                generator: client.clone(),
                embedder: client,
            })
        }
        BackendConfig::Azure {
            endpoint,
            api_key,
            api_version,
            chat_deployment,
            embedding_deployment,
        } => {
            let client = Arc::new(AzureOpenAiClient::new(
                AzureDeployment {
                    endpoint: endpoint.clone(),
                    api_key: api_key.clone(),
                    api_version: api_version.clone(),
                    chat_deployment: chat_deployment.clone(),
                    embedding_deployment: embedding_deployment.clone(),
                },
                config.timeout_secs,
            )?);
            tracing::info!(endpoint = %endpoint, deployment = %chat_deployment, "Using Azure OpenAI backend");
            Ok(Backends {
                generator: client.clone(),
                embedder: client,
            })
        }
    }
}

/// Map a transport failure to the error taxonomy shared by both HTTP backends.
pub(crate) fn transport_error(err: reqwest::Error, target: &str, timeout_secs: u64) -> LlmError {
    if err.is_connect() {
        LlmError::BackendUnavailable(format!("cannot connect to {target}"))
    } else if err.is_timeout() {
        LlmError::BackendUnavailable(format!("request timed out after {timeout_secs}s"))
    } else {
        LlmError::BackendUnavailable(err.to_string())
    }
}

/// Shared blocking HTTP client with a request timeout.
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, LlmError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::Configuration(format!("failed to create HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_config_builds_backends() {
        let config = AuditConfig::from_lookup(|_| None).unwrap();
        assert!(backends_from_config(&config).is_ok());
    }

    #[test]
    fn azure_config_builds_backends() {
        let config = AuditConfig::from_lookup(|key| match key {
            "AUDIT_BACKEND" => Some("azure".into()),
            "AZURE_OPENAI_ENDPOINT" => Some("https://example.openai.azure.com".into()),
            "AZURE_OPENAI_API_KEY" => Some("secret".into()),
            "AZURE_OPENAI_API_VERSION" => Some("2024-02-01".into()),
            "AZURE_DEPLOYMENT_NAME" => Some("gpt-4o".into()),
            "AZURE_EMBEDDING_DEPLOYMENT" => Some("text-embedding-3-small".into()),
            _ => None,
        })
        .unwrap();
        assert!(backends_from_config(&config).is_ok());
    }

    #[test]
    fn llm_error_converts_to_embedding_error() {
        let err: StorageError = LlmError::BackendUnavailable("down".into()).into();
        assert!(matches!(err, StorageError::Embedding(msg) if msg.contains("down")));
    }
}
