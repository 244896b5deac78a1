use super::types::{Chunker, TextChunk};

/// Fixed-size overlapping window chunker for guideline text.
///
/// Windows are measured in characters. A window prefers to end right after a
/// sentence boundary (". ") found in its last fifth; otherwise it is cut at
/// the size limit. Consecutive windows share `overlap_chars` characters.
pub struct WindowChunker {
    max_chunk_chars: usize,
    overlap_chars: usize,
}

impl WindowChunker {
    pub fn new(max_chunk_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chunk_chars: max_chunk_chars.max(1),
            overlap_chars,
        }
    }
}

impl Default for WindowChunker {
    fn default() -> Self {
        Self::new(1000, 100)
    }
}

impl Chunker for WindowChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let max = self.max_chunk_chars;

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let end = (start + max).min(len);

            let break_at = if end < len {
                let search_start = start + (max * 4 / 5);
                (search_start..end.saturating_sub(1))
                    .rev()
                    .find(|&i| chars[i] == '.' && chars[i + 1].is_whitespace())
                    .map(|i| i + 2)
                    .unwrap_or(end)
            } else {
                end
            };

            let window: String = chars[start..break_at].iter().collect();
            let content = window.trim();
            if !content.is_empty() {
                let leading = window.chars().take_while(|c| c.is_whitespace()).count();
                chunks.push(TextChunk {
                    content: content.to_string(),
                    chunk_index: chunks.len(),
                    char_offset: start + leading,
                });
            }

            if break_at >= len {
                break;
            }

            let next = break_at.saturating_sub(self.overlap_chars);
            start = if next > start { next } else { break_at };
        }

        chunks
    }
}
