use std::sync::atomic::{AtomicBool, Ordering};

use sha2::{Digest, Sha256};

use super::types::EmbeddingModel;
use super::StorageError;

/// Dimension of the offline hashing embedder.
pub const HASHING_DIM: usize = 256;

/// Deterministic embedding model for tests and offline runs.
///
/// Feature-hashes lower-cased words into a fixed number of buckets, so texts
/// sharing vocabulary score higher than unrelated texts. No model download,
/// no network. `set_offline(true)` makes every call fail as an unreachable
/// backend would.
pub struct MockEmbedder {
    dimension: usize,
    offline: AtomicBool,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::with_dimension(HASHING_DIM)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            offline: AtomicBool::new(false),
        }
    }

    /// An embedder whose backend is unreachable from the start.
    pub fn offline() -> Self {
        let embedder = Self::new();
        embedder.set_offline(true);
        embedder
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Embedding(
                "Backend unavailable: embedding backend offline".into(),
            ));
        }
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        self.check_online()?;
        Ok(hashed_vector(text, self.dimension))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
        self.check_online()?;
        Ok(texts
            .iter()
            .map(|t| hashed_vector(t, self.dimension))
            .collect())
    }
}

fn hashed_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dim];

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let digest = Sha256::digest(word.to_lowercase().as_bytes());
        let bucket = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize % dim;
        let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign;
    }

    l2_normalize(&mut vec);
    vec
}

/// Scale a vector to unit length in place; zero vectors are left untouched.
pub fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vec.iter_mut() {
            *val /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::storage::vectordb::cosine_similarity;

    #[test]
    fn mock_embed_returns_correct_dimension() {
        let embedder = MockEmbedder::new();
        assert_eq!(embedder.embed("Hello world").unwrap().len(), HASHING_DIM);
    }

    #[test]
    fn mock_embed_batch_returns_correct_count() {
        let embedder = MockEmbedder::with_dimension(32);
        let vecs = embedder.embed_batch(&["one", "two", "three"]).unwrap();
        assert_eq!(vecs.len(), 3);
        assert!(vecs.iter().all(|v| v.len() == 32));
    }

    #[test]
    fn mock_embed_is_deterministic() {
        let embedder = MockEmbedder::new();
        assert_eq!(
            embedder.embed("same text").unwrap(),
            embedder.embed("same text").unwrap()
        );
    }

    #[test]
    fn mock_embed_is_case_insensitive() {
        let embedder = MockEmbedder::new();
        assert_eq!(
            embedder.embed("Confidence Intervals").unwrap(),
            embedder.embed("confidence intervals").unwrap()
        );
    }

    #[test]
    fn shared_vocabulary_scores_higher() {
        let embedder = MockEmbedder::new();
        let query = embedder.embed("confidence intervals and p-values").unwrap();
        let related = embedder
            .embed("Always report confidence intervals alongside p-values.")
            .unwrap();
        let unrelated = embedder.embed("Figure axes need readable labels.").unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn mock_embed_is_l2_normalized() {
        let vec = MockEmbedder::new().embed("test normalization").unwrap();
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01, "got norm = {norm}");
    }

    #[test]
    fn empty_text_gives_zero_vector() {
        let vec = MockEmbedder::new().embed("  ").unwrap();
        assert!(vec.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn offline_embedder_fails_until_restored() {
        let embedder = MockEmbedder::offline();
        assert!(matches!(embedder.embed("x"), Err(StorageError::Embedding(_))));
        assert!(matches!(embedder.embed_batch(&["x"]), Err(StorageError::Embedding(_))));
        embedder.set_offline(false);
        assert!(embedder.embed("x").is_ok());
    }
}
