pub mod types;
pub mod prompt;
pub mod excerpt;
pub mod classify;
pub mod compliance;
pub mod synthesis;
pub mod orchestrator;

pub use types::*;
pub use excerpt::*;
pub use classify::*;
pub use compliance::*;
pub use synthesis::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::pipeline::llm::LlmError;
use crate::pipeline::storage::StorageError;

/// Failure taxonomy seen by the audit stages. Inside a run every variant is
/// turned into a degraded finding; only backend construction surfaces it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No guideline material: {0}")]
    EmptyCorpus(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<StorageError> for AuditError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Configuration(msg) => AuditError::Configuration(msg),
            StorageError::MissingDirectory(_) => AuditError::Configuration(err.to_string()),
            StorageError::EmptyCorpus(category) => AuditError::EmptyCorpus(category),
            other => AuditError::BackendUnavailable(other.to_string()),
        }
    }
}

impl From<LlmError> for AuditError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) => AuditError::Configuration(msg),
            other => AuditError::BackendUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_taxonomy() {
        assert!(matches!(
            AuditError::from(StorageError::Configuration("not built".into())),
            AuditError::Configuration(_)
        ));
        assert_eq!(
            AuditError::from(StorageError::EmptyCorpus("causality".into())),
            AuditError::EmptyCorpus("causality".into())
        );
        assert!(matches!(
            AuditError::from(StorageError::Embedding("timeout".into())),
            AuditError::BackendUnavailable(_)
        ));
    }

    #[test]
    fn llm_errors_map_to_taxonomy() {
        assert!(matches!(
            AuditError::from(LlmError::Configuration("no key".into())),
            AuditError::Configuration(_)
        ));
        assert!(matches!(
            AuditError::from(LlmError::Backend { status: 500, body: "oops".into() }),
            AuditError::BackendUnavailable(msg) if msg.contains("500")
        ));
    }
}
