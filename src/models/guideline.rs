use serde::{Deserialize, Serialize};

use super::enums::GuidelineCategory;

/// One guideline source file, as loaded into the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineDocument {
    /// File name the text was read from.
    pub source: String,
    pub category: GuidelineCategory,
    pub text: String,
}

/// A window of guideline text offered to retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineChunk {
    pub source: String,
    pub category: GuidelineCategory,
    pub content: String,
    /// Position across the whole corpus: document order first, then window order.
    /// Used as the tie-break key when similarity scores are equal.
    pub ordinal: usize,
    /// Character offset of the window inside its document.
    pub char_offset: usize,
}
