use anyhow::Result as AnyResult;
use lopdf::Document;
use std::path::Path;

use pagedeck_core::{
    ConversionKind, ConversionReport, ConvertError, ConvertOptions, Converter, PageRasterizer, ProgressFn,
    TextSource,
};
use pagedeck_pdf::{bind_pdfium, build_clean_document, extract_pages, load_document, save_to_bytes, PdfiumTextSource};
use pagedeck_pptx::Deck;
use pagedeck_render::PdfiumRasterizer;

use super::rebuild::{accept_spans, rebuild_deck};
use super::{deck_title, write_output};

/// Editable text boxes over a text-free rasterized background.
pub struct HybridConverter;

impl Converter for HybridConverter {
    fn kind(&self) -> ConversionKind {
        ConversionKind::Hybrid
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
        let source = pdfium
            .load_pdf_from_file(input, None)
            .map_err(|e| ConvertError::Open(format!("{}: {}", input.display(), e)))?;
        let text = PdfiumTextSource::new(source, &original);

        let mut report = ConversionReport::new(self.kind(), original.get_pages().len());
        let deck = hybrid_deck(
            &original,
            &text,
            |bytes| PdfiumRasterizer::from_bytes(&pdfium, bytes),
            options,
            progress,
            &mut report,
        )?;

        write_output(&deck.with_title(deck_title(input)), output)?;
        log::info!(
            "[Rebuild] {} slides, {} text boxes, {} warnings",
            report.slides,
            report.text_boxes,
            report.warnings.len()
        );
        Ok(report)
    }
}

/// Runs the three stages in order: extract every page, redact a working copy,
/// rebuild slides from the rasterized copy. Spans are validated once, so every
/// text box has its source hidden and every rejected span stays visible.
///
/// `open_clean` turns the serialized working copy into a rasterizer.
pub(crate) fn hybrid_deck<R, F>(
    original: &Document,
    text: &dyn TextSource,
    open_clean: F,
    options: &ConvertOptions,
    progress: &mut ProgressFn<'_>,
    report: &mut ConversionReport,
) -> Result<Deck, ConvertError>
where
    R: PageRasterizer,
    F: FnOnce(Vec<u8>) -> AnyResult<R>,
{
    let pages = accept_spans(&extract_pages(text, report), report);

    let mut clean = build_clean_document(original, &pages, options.redaction_margin, report);
    let bytes = save_to_bytes(&mut clean)?;
    log::info!("[Redact] working copy ready ({} bytes)", bytes.len());

    let rasterizer = open_clean(bytes).map_err(|e| ConvertError::WorkingCopy(format!("{:#}", e)))?;
    rebuild_deck(&pages, &rasterizer, options.dpi, progress, report)
}
