use super::StorageError;
use crate::models::{GuidelineCategory, GuidelineChunk};

/// A window of text cut from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    pub chunk_index: usize,
    pub char_offset: usize,
}

/// Chunking strategy trait
pub trait Chunker: Send + Sync {
    fn chunk(&self, text: &str) -> Vec<TextChunk>;
}

/// Embedding model abstraction
pub trait EmbeddingModel: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError>;
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError>;
}

/// Top-k guideline lookup, optionally scoped to one category.
pub trait GuidelineRetriever: Send + Sync {
    fn retrieve(
        &self,
        query: &str,
        k: usize,
        category: Option<GuidelineCategory>,
    ) -> Result<Vec<GuidelineChunk>, StorageError>;
}
