//! Guideline corpus: loading, filename categorization, and scoped top-k lookup.

use std::path::Path;
use std::sync::Arc;

use super::types::{Chunker, EmbeddingModel, GuidelineRetriever};
use super::vectordb::InMemoryVectorIndex;
use super::StorageError;
use crate::models::{GuidelineCategory, GuidelineChunk, GuidelineDocument};
use crate::pipeline::extraction::TextExtractor;

/// Filename keyword rules, evaluated top to bottom; first match wins.
const CATEGORY_RULES: &[(&[&str], GuidelineCategory)] = &[
    (&["causality"], GuidelineCategory::Causality),
    (&["figure", "table"], GuidelineCategory::FiguresTables),
    (&["systematic", "meta"], GuidelineCategory::SystematicReview),
    (&["stat"], GuidelineCategory::Statistics),
];

/// Infer a guideline category from a file name (case-insensitive substring match).
pub fn categorize(filename: &str) -> GuidelineCategory {
    let lower = filename.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(GuidelineCategory::Other)
}

/// Read every eligible file of `dir`, in file-name order.
pub fn load_guideline_documents(
    dir: &Path,
    extractor: &dyn TextExtractor,
) -> Result<Vec<GuidelineDocument>, StorageError> {
    if !dir.is_dir() {
        return Err(StorageError::MissingDirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && extractor.supports(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(StorageError::EmptyCorpus(format!(
            "{} (no supported guideline files)",
            dir.display()
        )));
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let category = categorize(&source);
        let text = extractor.extract(path)?;

        tracing::info!(
            source = %source,
            category = category.as_str(),
            chars = text.chars().count(),
            "Loaded guideline document"
        );

        documents.push(GuidelineDocument {
            source,
            category,
            text,
        });
    }

    Ok(documents)
}

/// Immutable, embedded guideline corpus.
pub struct GuidelineStore {
    documents: Vec<GuidelineDocument>,
    index: InMemoryVectorIndex,
    embedder: Arc<dyn EmbeddingModel>,
}

impl GuidelineStore {
    /// Load, chunk and embed every guideline file in `dir`.
    pub fn load(
        dir: &Path,
        extractor: &dyn TextExtractor,
        chunker: &dyn Chunker,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, StorageError> {
        let documents = load_guideline_documents(dir, extractor)?;
        Self::from_documents(documents, chunker, embedder)
    }

    /// Chunk and embed already-loaded documents. Chunk ordinals follow the
    /// order of `documents`.
    pub fn from_documents(
        documents: Vec<GuidelineDocument>,
        chunker: &dyn Chunker,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, StorageError> {
        let mut index = InMemoryVectorIndex::new();
        let mut ordinal = 0;

        for doc in &documents {
            let chunks = chunker.chunk(&doc.text);
            if chunks.is_empty() {
                tracing::warn!(source = %doc.source, "Guideline document has no text");
                continue;
            }

            let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            let embeddings = embedder.embed_batch(&texts)?;
            if embeddings.len() != chunks.len() {
                return Err(StorageError::Embedding(format!(
                    "{} embeddings returned for {} chunks of {}",
                    embeddings.len(),
                    chunks.len(),
                    doc.source
                )));
            }

            for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
                index.insert(
                    GuidelineChunk {
                        source: doc.source.clone(),
                        category: doc.category,
                        content: chunk.content,
                        ordinal,
                        char_offset: chunk.char_offset,
                    },
                    embedding,
                )?;
                ordinal += 1;
            }
        }

        if index.count() == 0 {
            return Err(StorageError::EmptyCorpus("all categories (no guideline text)".into()));
        }

        tracing::info!(
            documents = documents.len(),
            chunks = index.count(),
            "Guideline store ready"
        );

        Ok(Self {
            documents,
            index,
            embedder,
        })
    }

    /// The `k` chunks most similar to `text`, restricted to `category` if given.
    pub fn query(
        &self,
        text: &str,
        k: usize,
        category: Option<GuidelineCategory>,
    ) -> Result<Vec<GuidelineChunk>, StorageError> {
        let available = match category {
            Some(c) => self.index.count_for_category(c),
            None => self.index.count(),
        };
        if available == 0 {
            return Err(StorageError::EmptyCorpus(
                category.map_or_else(|| "all categories".to_string(), |c| c.to_string()),
            ));
        }

        let query_embedding = self.embedder.embed(text)?;
        let results = self.index.search(&query_embedding, k, category);

        tracing::debug!(
            category = category.map(|c| c.as_str()),
            requested = k,
            returned = results.len(),
            "Guideline query"
        );

        Ok(results.into_iter().map(|scored| scored.chunk).collect())
    }

    pub fn documents(&self) -> &[GuidelineDocument] {
        &self.documents
    }

    pub fn chunk_count(&self) -> usize {
        self.index.count()
    }

    /// Chunk count for every category, in declaration order.
    pub fn category_counts(&self) -> Vec<(GuidelineCategory, usize)> {
        GuidelineCategory::ALL
            .iter()
            .map(|c| (*c, self.index.count_for_category(*c)))
            .collect()
    }
}

impl std::fmt::Debug for GuidelineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuidelineStore")
            .field("documents", &self.documents.len())
            .field("chunks", &self.index.count())
            .finish()
    }
}

impl GuidelineRetriever for GuidelineStore {
    fn retrieve(
        &self,
        query: &str,
        k: usize,
        category: Option<GuidelineCategory>,
    ) -> Result<Vec<GuidelineChunk>, StorageError> {
        self.query(query, k, category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::PlainTextExtractor;
    use crate::pipeline::storage::chunker::WindowChunker;
    use crate::pipeline::storage::embedder::MockEmbedder;

    fn write_corpus(dir: &Path) {
        std::fs::write(
            dir.join("statistics_guidelines.txt"),
            "Report exact p-values. Always give confidence intervals for effect sizes.",
        )
        .unwrap();
        std::fs::write(
            dir.join("Figures_and_Tables.md"),
            "Tables must state units. Figure axes need labels.",
        )
        .unwrap();
        std::fs::write(
            dir.join("causality-language.txt"),
            "Observational studies must avoid causal language such as 'caused' or 'led to'.",
        )
        .unwrap();
        std::fs::write(
            dir.join("prisma-systematic-review.txt"),
            "Follow PRISMA. Report heterogeneity and the search strategy.",
        )
        .unwrap();
        std::fs::write(dir.join("ignored.pdf"), b"%PDF-1.4").unwrap();
    }

    fn load(dir: &Path) -> Result<GuidelineStore, StorageError> {
        GuidelineStore::load(
            dir,
            &PlainTextExtractor,
            &WindowChunker::new(40, 5),
            Arc::new(MockEmbedder::new()),
        )
    }

    #[test]
    fn categorize_keyword_rules() {
        assert_eq!(categorize("Causality_Guidelines.pdf"), GuidelineCategory::Causality);
        assert_eq!(categorize("figures.pdf"), GuidelineCategory::FiguresTables);
        assert_eq!(categorize("TABLE-guide.txt"), GuidelineCategory::FiguresTables);
        assert_eq!(categorize("systematic_reviews.pdf"), GuidelineCategory::SystematicReview);
        assert_eq!(categorize("Meta-Analysis.pdf"), GuidelineCategory::SystematicReview);
        assert_eq!(categorize("EU_Statistics.pdf"), GuidelineCategory::Statistics);
        assert_eq!(categorize("consort.pdf"), GuidelineCategory::Other);
    }

    #[test]
    fn categorize_first_rule_wins() {
        // "causality" outranks "stat", "meta" outranks "stat".
        assert_eq!(categorize("causality_statistics.pdf"), GuidelineCategory::Causality);
        assert_eq!(categorize("meta_statistics.pdf"), GuidelineCategory::SystematicReview);
    }

    #[test]
    fn categorize_is_stable() {
        for _ in 0..3 {
            assert_eq!(categorize("Reporting_Tables.pdf"), GuidelineCategory::FiguresTables);
        }
    }

    #[test]
    fn load_missing_directory_is_configuration_error() {
        let err = load(Path::new("/nonexistent/guidelines")).unwrap_err();
        assert!(matches!(err, StorageError::MissingDirectory(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn load_empty_directory_is_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, StorageError::EmptyCorpus(_)));
    }

    #[test]
    fn load_reads_supported_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let store = load(dir.path()).unwrap();
        let sources: Vec<&str> = store.documents().iter().map(|d| d.source.as_str()).collect();
        assert_eq!(
            sources,
            vec![
                "Figures_and_Tables.md",
                "causality-language.txt",
                "prisma-systematic-review.txt",
                "statistics_guidelines.txt",
            ]
        );
        assert!(store.chunk_count() >= 4);
    }

    #[test]
    fn chunks_never_cross_documents() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let store = load(dir.path()).unwrap();

        let all = store.query("anything", 100, None).unwrap();
        for chunk in &all {
            let doc = store
                .documents()
                .iter()
                .find(|d| d.source == chunk.source)
                .unwrap();
            assert!(doc.text.contains(&chunk.content));
            assert_eq!(doc.category, chunk.category);
        }
    }

    #[test]
    fn load_skips_subdirectories_named_like_guidelines() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        std::fs::create_dir(dir.path().join("statistics_archive.txt")).unwrap();

        let store = load(dir.path()).unwrap();
        assert_eq!(store.documents().len(), 4);
    }

    #[test]
    fn query_fails_when_embedding_backend_goes_down() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let embedder = Arc::new(MockEmbedder::new());
        let store = GuidelineStore::load(
            dir.path(),
            &PlainTextExtractor,
            &WindowChunker::new(40, 5),
            Arc::clone(&embedder) as Arc<dyn EmbeddingModel>,
        )
        .unwrap();

        embedder.set_offline(true);
        let err = store
            .query("p-values", 5, Some(GuidelineCategory::Statistics))
            .unwrap_err();
        assert!(matches!(err, StorageError::Embedding(_)));
    }

    #[test]
    fn load_with_offline_embedder_is_embedding_error() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let err = GuidelineStore::load(
            dir.path(),
            &PlainTextExtractor,
            &WindowChunker::default(),
            Arc::new(MockEmbedder::offline()),
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::Embedding(_)));
    }

    #[test]
    fn query_never_exceeds_k() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let store = load(dir.path()).unwrap();

        for k in 0..4 {
            assert!(store.query("p-values", k, None).unwrap().len() <= k);
        }
    }

    #[test]
    fn query_respects_category_filter() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let store = load(dir.path()).unwrap();

        for category in GuidelineCategory::AUDITED {
            let results = store.query("report confidence intervals", 5, Some(*category)).unwrap();
            assert!(!results.is_empty());
            assert!(results.iter().all(|c| c.category == *category));
        }
    }

    #[test]
    fn query_empty_category_is_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let store = load(dir.path()).unwrap();

        let err = store
            .query("anything", 5, Some(GuidelineCategory::Other))
            .unwrap_err();
        assert!(matches!(err, StorageError::EmptyCorpus(ref c) if c == "other"));
    }

    #[test]
    fn query_prefers_matching_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let store = load(dir.path()).unwrap();

        let top = store.query("PRISMA heterogeneity search strategy", 1, None).unwrap();
        assert_eq!(top[0].source, "prisma-systematic-review.txt");
    }

    #[test]
    fn query_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let first = load(dir.path()).unwrap().query("units and labels", 3, None).unwrap();
        let second = load(dir.path()).unwrap().query("units and labels", 3, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn category_counts_cover_every_category() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let counts = load(dir.path()).unwrap().category_counts();

        assert_eq!(counts.len(), GuidelineCategory::ALL.len());
        let other = counts
            .iter()
            .find(|(c, _)| *c == GuidelineCategory::Other)
            .unwrap();
        assert_eq!(other.1, 0);
    }

    #[test]
    fn blank_documents_only_is_empty_corpus() {
        let documents = vec![GuidelineDocument {
            source: "statistics.txt".into(),
            category: GuidelineCategory::Statistics,
            text: "   ".into(),
        }];
        let err = GuidelineStore::from_documents(
            documents,
            &WindowChunker::default(),
            Arc::new(MockEmbedder::new()),
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::EmptyCorpus(_)));
    }
}
