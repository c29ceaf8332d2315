use std::path::Path;

use pagedeck_core::{ConversionKind, ConversionReport, ConvertError, ConvertOptions, Converter, ProgressFn};
use pagedeck_pdf::{bind_pdfium, load_document};
use pagedeck_render::PdfiumRasterizer;

use super::rebuild::flatten_deck;
use super::{deck_title, write_output};

/// Every page flattened into one picture; nothing stays editable.
pub struct ImageOnlyConverter;

impl Converter for ImageOnlyConverter {
    fn kind(&self) -> ConversionKind {
        ConversionKind::ImageOnly
    }

    fn convert(
        &self,
        input: &Path,
        output: &Path,
        progress: &mut ProgressFn<'_>,
        options: &ConvertOptions,
    ) -> Result<ConversionReport, ConvertError> {
        options.validate()?;
        let original = load_document(input)?;

        let pdfium = bind_pdfium(options.pdfium_dir.as_deref())?;
        let document = pdfium
            .load_pdf_from_file(input, None)
            .map_err(|e| ConvertError::Open(format!("{}: {}", input.display(), e)))?;
        let rasterizer = PdfiumRasterizer::new(document);

        let mut report = ConversionReport::new(self.kind(), original.get_pages().len());
        let deck = flatten_deck(&rasterizer, options.dpi, progress, &mut report)?;

        write_output(&deck.with_title(deck_title(input)), output)?;
        log::info!(
            "[Rebuild] {} flattened slides, {} warnings",
            report.slides,
            report.warnings.len()
        );
        Ok(report)
    }
}
