pub mod types;
pub mod chunker;
pub mod embedder;
pub mod vectordb;
pub mod guideline_store;
pub mod knowledge_base;

pub use types::*;
pub use chunker::*;
pub use embedder::*;
pub use guideline_store::*;
pub use knowledge_base::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::extraction::ExtractionError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Guidelines folder not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No guideline material for {0}")]
    EmptyCorpus(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorDb(String),
}

impl StorageError {
    /// Missing directory and unbuilt knowledge base are both configuration problems.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingDirectory(_) | Self::Configuration(_))
    }
}
