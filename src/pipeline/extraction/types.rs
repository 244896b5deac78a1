use std::path::Path;

use super::ExtractionError;

/// Turns a source file into plain text.
///
/// Implementations decide which files they handle through `supports`;
/// the guideline loader only offers them files they claim.
pub trait TextExtractor: Send + Sync {
    fn supports(&self, path: &Path) -> bool;
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Lower-cased file extension, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lower_cased() {
        assert_eq!(extension_of(Path::new("CONSORT.PDF")).as_deref(), Some("pdf"));
        assert_eq!(extension_of(Path::new("notes")), None);
    }
}
