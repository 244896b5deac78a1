//! Character-budgeted manuscript excerpts.
//!
//! Budgets count `char`s, so slicing never splits a UTF-8 sequence.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", content = "chars", rename_all = "snake_case")]
pub enum ExcerptPolicy {
    /// The whole manuscript.
    FullText,
    /// The first `n` characters.
    Leading(usize),
    /// The last `n` characters.
    Terminal(usize),
    /// `n` characters either side of the midpoint.
    Centered(usize),
}

impl ExcerptPolicy {
    pub fn select<'t>(&self, text: &'t str) -> &'t str {
        let total = text.chars().count();
        let (start, end) = match *self {
            ExcerptPolicy::FullText => return text,
            ExcerptPolicy::Leading(n) => (0, n.min(total)),
            ExcerptPolicy::Terminal(n) => (total.saturating_sub(n), total),
            ExcerptPolicy::Centered(half) => {
                let mid = total / 2;
                (mid.saturating_sub(half), (mid + half).min(total))
            }
        };
        &text[byte_offset(text, start)..byte_offset(text, end)]
    }
}

/// Byte index of the `char_index`-th character (or `text.len()` past the end).
fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_text_is_untouched() {
        assert_eq!(ExcerptPolicy::FullText.select("abc"), "abc");
    }

    #[test]
    fn leading_and_terminal_budgets() {
        let text = "0123456789";
        assert_eq!(ExcerptPolicy::Leading(3).select(text), "012");
        assert_eq!(ExcerptPolicy::Terminal(3).select(text), "789");
        assert_eq!(ExcerptPolicy::Leading(50).select(text), text);
        assert_eq!(ExcerptPolicy::Terminal(50).select(text), text);
    }

    #[test]
    fn centered_window_around_midpoint() {
        let text = "0123456789";
        assert_eq!(ExcerptPolicy::Centered(2).select(text), "3456");
        assert_eq!(ExcerptPolicy::Centered(100).select(text), text);
    }

    #[test]
    fn budgets_count_characters_not_bytes() {
        let text = "ééééé";
        assert_eq!(ExcerptPolicy::Leading(2).select(text), "éé");
        assert_eq!(ExcerptPolicy::Terminal(1).select(text), "é");
        assert_eq!(ExcerptPolicy::Centered(1).select(text), "éé");
    }

    #[test]
    fn empty_text_yields_empty_excerpt() {
        assert_eq!(ExcerptPolicy::Centered(10).select(""), "");
        assert_eq!(ExcerptPolicy::Terminal(10).select(""), "");
    }
}
