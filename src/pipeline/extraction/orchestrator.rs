use std::path::Path;

use super::text_only::PlainTextExtractor;
use super::types::TextExtractor;
use super::ExtractionError;

/// Dispatches each file to the first extractor that supports it.
pub struct DocumentExtractor {
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl DocumentExtractor {
    pub fn new(extractors: Vec<Box<dyn TextExtractor>>) -> Self {
        Self { extractors }
    }

    /// Plain text always; PDF when built with the `pdfium` feature and the
    /// library can be loaded.
    pub fn with_defaults() -> Self {
        let mut extractors: Vec<Box<dyn TextExtractor>> = vec![Box::new(PlainTextExtractor)];
        extractors.extend(pdf_extractor());
        Self::new(extractors)
    }
}

#[cfg(feature = "pdfium")]
fn pdf_extractor() -> Option<Box<dyn TextExtractor>> {
    match super::pdfium::PdfiumTextExtractor::new() {
        Ok(pdf) => Some(Box::new(pdf)),
        Err(e) => {
            tracing::warn!(error = %e, "PDF extraction disabled");
            None
        }
    }
}

#[cfg(not(feature = "pdfium"))]
fn pdf_extractor() -> Option<Box<dyn TextExtractor>> {
    None
}

impl TextExtractor for DocumentExtractor {
    fn supports(&self, path: &Path) -> bool {
        self.extractors.iter().any(|e| e.supports(path))
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        self.extractors
            .iter()
            .find(|e| e.supports(path))
            .ok_or_else(|| ExtractionError::UnsupportedFormat(path.to_path_buf()))?
            .extract(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpperExtractor;

    impl TextExtractor for UpperExtractor {
        fn supports(&self, path: &Path) -> bool {
            path.to_string_lossy().ends_with(".up")
        }

        fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
            Ok("UPPER".into())
        }
    }

    #[test]
    fn dispatches_to_supporting_extractor() {
        let extractor =
            DocumentExtractor::new(vec![Box::new(PlainTextExtractor), Box::new(UpperExtractor)]);
        assert!(extractor.supports(Path::new("a.up")));
        assert_eq!(extractor.extract(Path::new("a.up")).unwrap(), "UPPER");
    }

    #[test]
    fn unsupported_file_errors() {
        let extractor = DocumentExtractor::new(vec![Box::new(PlainTextExtractor)]);
        assert!(!extractor.supports(Path::new("scan.tiff")));
        let err = extractor.extract(Path::new("scan.tiff")).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn defaults_include_plain_text() {
        assert!(DocumentExtractor::with_defaults().supports(Path::new("guideline.txt")));
    }

    #[test]
    fn pdf_extraction_is_compiled_in_by_default() {
        // Fails under --no-default-features.
        assert!(cfg!(feature = "pdfium"));
    }
}
