//! Plain-text extraction for guideline sources and manuscripts that are
//! already text (`.txt`, `.md`). No external library involved.

use std::path::Path;

use super::types::{extension_of, TextExtractor};
use super::ExtractionError;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn supports(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        if !self.supports(path) {
            return Err(ExtractionError::UnsupportedFormat(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|e| ExtractionError::EncodingError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), chars = text.chars().count(), "Read plain text");
        Ok(normalize_line_endings(&text))
    }
}

/// Normalize CRLF / CR line endings and strip a leading byte-order mark.
pub fn normalize_line_endings(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_text_extensions_only() {
        let extractor = PlainTextExtractor;
        assert!(extractor.supports(Path::new("statistics.txt")));
        assert!(extractor.supports(Path::new("Figures.MD")));
        assert!(!extractor.supports(Path::new("consort.pdf")));
        assert!(!extractor.supports(Path::new("README")));
    }

    #[test]
    fn reads_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.txt");
        std::fs::write(&path, "Report exact p-values (p = 0.03).\r\nAvoid p < 0.05.").unwrap();

        let text = PlainTextExtractor.extract(&path).unwrap();
        assert_eq!(text, "Report exact p-values (p = 0.03).\nAvoid p < 0.05.");
    }

    #[test]
    fn rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0xd8]).unwrap();

        let err = PlainTextExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::EncodingError { .. }));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let err = PlainTextExtractor
            .extract(Path::new("/nonexistent/paper.pdf"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn strips_byte_order_mark() {
        assert_eq!(normalize_line_endings("\u{feff}Title\rBody"), "Title\nBody");
    }
}
