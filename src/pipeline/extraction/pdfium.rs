//! PDF text-layer extraction via Google PDFium.
//!
//! `PdfiumTextExtractor` is stateless (`Send + Sync`). Each extraction binds
//! a fresh `Pdfium` instance because the upstream type is `!Send`; the OS
//! caches the dynamic library load, so repeat binds are cheap.

use std::path::Path;

use pdfium_render::prelude::*;
use tracing::debug;

use super::types::{extension_of, TextExtractor};
use super::ExtractionError;

pub struct PdfiumTextExtractor;

impl PdfiumTextExtractor {
    /// Create an extractor, verifying the PDFium library is loadable.
    pub fn new() -> Result<Self, ExtractionError> {
        let _ = load_pdfium()?;
        Ok(Self)
    }
}

/// Load the PDFium dynamic library.
///
/// Discovery order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` env var (explicit path)
/// 2. Alongside the running executable
/// 3. System library search paths
fn load_pdfium() -> Result<Pdfium, ExtractionError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        debug!(path = %path, "Loading PDFium from env var");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            ExtractionError::PdfiumUnavailable(format!("Failed to load PDFium from {path}: {e}"))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        let lib_path =
            Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!(dir = %exe_dir.display(), "Loaded PDFium next to executable");
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        ExtractionError::PdfiumUnavailable(format!(
            "Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

impl TextExtractor for PdfiumTextExtractor {
    fn supports(&self, path: &Path) -> bool {
        extension_of(path).as_deref() == Some("pdf")
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = std::fs::read(path)?;
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|e| ExtractionError::PdfParsing(format!("{}: {e}", path.display())))?;

        let mut pages = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let text = page.text().map_err(|e| {
                ExtractionError::PdfParsing(format!("page {} of {}: {e}", index + 1, path.display()))
            })?;
            pages.push(text.all());
        }

        debug!(path = %path.display(), pages = pages.len(), "Extracted PDF text layer");
        Ok(pages.join("\n"))
    }
}
