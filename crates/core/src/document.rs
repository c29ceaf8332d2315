//! Backend seams of the conversion pipeline.
//!
//! The pipeline only talks to documents through these traits, so the PDF
//! decoder and the rasterizer can be swapped (or faked in tests) without
//! touching the stage logic.

use anyhow::Result;
use std::path::Path;

use crate::geometry::PageSize;
use crate::options::{ConversionKind, ConvertOptions};
use crate::report::ConversionReport;
use crate::span::PageText;

/// Progress hook: `(pages_done, pages_total)`, called once per finished page.
///
/// Returning an error aborts the conversion.
pub type ProgressFn<'a> = dyn FnMut(usize, usize) -> Result<()> + 'a;

/// Read-only access to the structured text of a paginated document.
pub trait TextSource {
    fn page_count(&self) -> usize;

    /// Displayed size of page `index`, known even when its text is not.
    fn page_size(&self, index: usize) -> Result<PageSize>;

    /// Structured text of page `index`; an error means the page has no usable text.
    fn page_text(&self, index: usize) -> Result<PageText>;
}

/// A rendered page, PNG encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub page: usize,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Turns pages into pixels.
pub trait PageRasterizer {
    fn page_count(&self) -> usize;

    fn page_size(&self, index: usize) -> Result<PageSize>;

    fn rasterize(&self, index: usize, dpi: u32) -> Result<PageImage>;
}

/// One supported conversion strategy.
pub trait Converter {
    fn kind(&self) -> ConversionKind;

    /// Converts `input` into a slide deck at `output`.
    ///
    /// Nothing is written to `output` unless the conversion succeeds.
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        progress: &mut ProgressFn<'_>,
        options: &ConvertOptions,
    ) -> crate::Result<ConversionReport>;
}
