//! Shared, rebuildable handle on the active guideline store.
//!
//! The active store lives behind `RwLock<Option<Arc<GuidelineStore>>>`.
//! A rebuild loads, chunks and embeds the new corpus without holding the
//! lock, then swaps the `Arc` under a short write lock. Readers therefore see
//! either the previous corpus or the new one, never a partial build, and a
//! failed rebuild leaves the previous corpus active.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::chunker::WindowChunker;
use super::guideline_store::GuidelineStore;
use super::types::{EmbeddingModel, GuidelineRetriever};
use super::StorageError;
use crate::config::AuditConfig;
use crate::models::{GuidelineCategory, GuidelineChunk};
use crate::pipeline::extraction::TextExtractor;

/// Query used to check that each audited category answers a lookup.
pub const SMOKE_TEST_QUERY: &str = "statistical reporting guidelines";

/// How a build treats a missing/empty guideline folder or a category
/// without material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStrictness {
    /// Any problem fails the build; the previous corpus stays active.
    Strict,
    /// Problems are logged and reported in the summary.
    Lenient,
}

/// Outcome of a knowledge base build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub documents: usize,
    pub chunks: usize,
    pub category_chunks: Vec<(GuidelineCategory, usize)>,
    /// Audited categories whose smoke-test query failed (lenient builds only).
    pub missing_categories: Vec<GuidelineCategory>,
    /// True when a lenient build could not load the folder (missing, empty,
    /// unreadable, or embedding backend down) and kept the previous corpus.
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub built_at: DateTime<Utc>,
}

pub struct KnowledgeBase {
    active: RwLock<Option<Arc<GuidelineStore>>>,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingModel>,
    chunker: WindowChunker,
}

impl KnowledgeBase {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingModel>,
        chunker: WindowChunker,
    ) -> Self {
        Self {
            active: RwLock::new(None),
            extractor,
            embedder,
            chunker,
        }
    }

    /// Snapshot of the active store, if one has been built.
    pub fn current(&self) -> Option<Arc<GuidelineStore>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_built(&self) -> bool {
        self.current().is_some()
    }

    /// Publish a fully built store, replacing the active one.
    pub fn install(&self, store: GuidelineStore) {
        let store = Arc::new(store);
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some(store);
    }

    /// Build a fresh store from `dir`, smoke-test every audited category,
    /// and swap it in.
    pub fn rebuild(
        &self,
        dir: &Path,
        strictness: BuildStrictness,
    ) -> Result<BuildSummary, StorageError> {
        tracing::info!(dir = %dir.display(), ?strictness, "Building knowledge base");

        let store = match GuidelineStore::load(
            dir,
            self.extractor.as_ref(),
            &self.chunker,
            Arc::clone(&self.embedder),
        ) {
            Ok(store) => store,
            Err(e) if strictness == BuildStrictness::Lenient => {
                tracing::warn!(error = %e, "Knowledge base build skipped");
                return Ok(BuildSummary {
                    documents: 0,
                    chunks: 0,
                    category_chunks: Vec::new(),
                    missing_categories: GuidelineCategory::AUDITED.to_vec(),
                    skipped: true,
                    skip_reason: Some(e.to_string()),
                    built_at: Utc::now(),
                });
            }
            Err(e) => return Err(e),
        };

        let mut missing_categories = Vec::new();
        for category in GuidelineCategory::AUDITED {
            match store.query(SMOKE_TEST_QUERY, 1, Some(*category)) {
                Ok(_) => {}
                Err(e) if strictness == BuildStrictness::Strict => return Err(e),
                Err(e) => {
                    tracing::warn!(category = category.as_str(), error = %e, "Smoke test failed");
                    missing_categories.push(*category);
                }
            }
        }

        let summary = BuildSummary {
            documents: store.documents().len(),
            chunks: store.chunk_count(),
            category_chunks: store.category_counts(),
            missing_categories,
            skipped: false,
            skip_reason: None,
            built_at: Utc::now(),
        };

        self.install(store);
        tracing::info!(
            documents = summary.documents,
            chunks = summary.chunks,
            "Knowledge base ready"
        );

        Ok(summary)
    }
}

/// Create a knowledge base sized by `config` and build it from the
/// configured guidelines folder.
pub fn build_knowledge_base(
    config: &AuditConfig,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingModel>,
    strictness: BuildStrictness,
) -> Result<(KnowledgeBase, BuildSummary), StorageError> {
    let chunker = WindowChunker::new(config.settings.chunk_size, config.settings.chunk_overlap);
    let kb = KnowledgeBase::new(extractor, embedder, chunker);
    let summary = kb.rebuild(&config.guidelines_dir, strictness)?;
    Ok((kb, summary))
}

impl GuidelineRetriever for KnowledgeBase {
    fn retrieve(
        &self,
        query: &str,
        k: usize,
        category: Option<GuidelineCategory>,
    ) -> Result<Vec<GuidelineChunk>, StorageError> {
        let store = self.current().ok_or_else(|| {
            StorageError::Configuration("Knowledge base not built. Build it first.".into())
        })?;
        store.query(query, k, category)
    }
}
