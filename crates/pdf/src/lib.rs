//! PDF side of the conversion: structured text extraction through pdfium and
//! background redaction on an lopdf working copy.

pub mod binding;
pub mod extract;
pub mod fonts;
pub mod redact;
mod scan;
mod utils;

pub use binding::{bind_pdfium, PDFIUM_DIR_ENV};
pub use extract::{extract_pages, group_glyphs, Glyph, PdfiumTextSource};
pub use redact::{build_clean_document, regions_for_page, RedactError, RedactionRegion, RedactionStats};
pub use utils::{get_page_box, PageBox};

use lopdf::Document;
use pagedeck_core::ConvertError;
use std::path::Path;

/// Loads the source document and rejects one without pages.
pub fn load_document(path: &Path) -> Result<Document, ConvertError> {
    let doc = Document::load(path).map_err(|e| ConvertError::Open(format!("{}: {}", path.display(), e)))?;
    if doc.get_pages().is_empty() {
        return Err(ConvertError::EmptyDocument);
    }
    log::info!("[Pdf] loaded {} ({} pages)", path.display(), doc.get_pages().len());
    Ok(doc)
}

/// Serializes a document into memory.
pub fn save_to_bytes(doc: &mut Document) -> Result<Vec<u8>, ConvertError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ConvertError::WorkingCopy(e.to_string()))?;
    Ok(buffer)
}
