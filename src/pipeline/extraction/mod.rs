pub mod types;
pub mod text_only;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod orchestrator;

pub use types::*;
pub use text_only::*;
pub use orchestrator::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Text encoding error in {path}: {reason}")]
    EncodingError { path: PathBuf, reason: String },

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDFium library unavailable: {0}")]
    PdfiumUnavailable(String),
}
