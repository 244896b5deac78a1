use super::StorageError;
use crate::models::{GuidelineCategory, GuidelineChunk};

/// A chunk with its relevance score (from vector search)
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: GuidelineChunk,
    pub score: f32,
}

struct StoredEntry {
    chunk: GuidelineChunk,
    embedding: Vec<f32>,
}

/// In-memory cosine-similarity index over guideline chunks.
///
/// Built once per knowledge base and never mutated after the owning store is
/// published, so searches need no locking.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    entries: Vec<StoredEntry>,
    dimension: Option<usize>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chunk: GuidelineChunk, embedding: Vec<f32>) -> Result<(), StorageError> {
        match self.dimension {
            Some(dim) if dim != embedding.len() => {
                return Err(StorageError::VectorDb(format!(
                    "Embedding dimension {} does not match index dimension {dim}",
                    embedding.len()
                )));
            }
            None => self.dimension = Some(embedding.len()),
            _ => {}
        }

        self.entries.push(StoredEntry { chunk, embedding });
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn count_for_category(&self, category: GuidelineCategory) -> usize {
        self.entries
            .iter()
            .filter(|e| e.chunk.category == category)
            .count()
    }

    /// Top-k by cosine similarity, ties broken by ascending chunk ordinal.
    pub fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        category: Option<GuidelineCategory>,
    ) -> Vec<ScoredChunk> {
        let mut scored: Vec<(f32, &StoredEntry)> = self
            .entries
            .iter()
            .filter(|entry| category.map_or(true, |c| entry.chunk.category == c))
            .map(|entry| (cosine_similarity(query_embedding, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.chunk.ordinal.cmp(&b.1.chunk.ordinal))
        });

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| ScoredChunk {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(ordinal: usize, category: GuidelineCategory) -> GuidelineChunk {
        GuidelineChunk {
            source: format!("doc{ordinal}.txt"),
            category,
            content: format!("chunk {ordinal}"),
            ordinal,
            char_offset: 0,
        }
    }

    #[test]
    fn cosine_similarity_identical_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.01);
    }

    #[test]
    fn cosine_similarity_orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.01);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn search_returns_top_k_most_similar() {
        let mut index = InMemoryVectorIndex::new();
        index.insert(chunk(0, GuidelineCategory::Statistics), vec![1.0, 0.0, 0.0]).unwrap();
        index.insert(chunk(1, GuidelineCategory::Statistics), vec![0.8, 0.6, 0.0]).unwrap();
        index.insert(chunk(2, GuidelineCategory::Statistics), vec![0.0, 1.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 2, None);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.ordinal, 0);
        assert_eq!(results[1].chunk.ordinal, 1);
    }

    #[test]
    fn search_filters_by_category() {
        let mut index = InMemoryVectorIndex::new();
        index.insert(chunk(0, GuidelineCategory::Statistics), vec![1.0, 0.0]).unwrap();
        index.insert(chunk(1, GuidelineCategory::Causality), vec![0.0, 1.0]).unwrap();
        index.insert(chunk(2, GuidelineCategory::Causality), vec![0.1, 1.0]).unwrap();

        let results = index.search(&[1.0, 0.0], 5, Some(GuidelineCategory::Causality));
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.chunk.category == GuidelineCategory::Causality));
    }

    #[test]
    fn equal_scores_keep_document_order() {
        let mut index = InMemoryVectorIndex::new();
        for ordinal in [3, 1, 2, 0] {
            index.insert(chunk(ordinal, GuidelineCategory::Other), vec![1.0, 1.0]).unwrap();
        }

        let ordinals: Vec<usize> = index
            .search(&[1.0, 1.0], 4, None)
            .into_iter()
            .map(|r| r.chunk.ordinal)
            .collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let mut index = InMemoryVectorIndex::new();
        index.insert(chunk(0, GuidelineCategory::Other), vec![1.0, 0.0]).unwrap();
        let err = index
            .insert(chunk(1, GuidelineCategory::Other), vec![1.0, 0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, StorageError::VectorDb(_)));
    }

    #[test]
    fn counts_per_category() {
        let mut index = InMemoryVectorIndex::new();
        index.insert(chunk(0, GuidelineCategory::Statistics), vec![1.0]).unwrap();
        index.insert(chunk(1, GuidelineCategory::Statistics), vec![1.0]).unwrap();
        index.insert(chunk(2, GuidelineCategory::Causality), vec![1.0]).unwrap();

        assert_eq!(index.count(), 3);
        assert_eq!(index.count_for_category(GuidelineCategory::Statistics), 2);
        assert_eq!(index.count_for_category(GuidelineCategory::SystematicReview), 0);
    }
}
