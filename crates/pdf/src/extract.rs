//! Structured text extraction: pdfium characters grouped into blocks, lines and spans.

use anyhow::{anyhow, Result};
use lopdf::Document;
use pdfium_render::prelude::*;

use pagedeck_core::document::TextSource;
use pagedeck_core::geometry::{PageSize, Rect};
use pagedeck_core::report::{ConversionReport, Stage};
use pagedeck_core::span::{ExtractedSpan, PageText, TextBlock, TextLine};

use crate::utils::{get_page_box, PageBox};

/// Horizontal gap, in em, that splits a line.
const MAX_GAP_EM: f32 = 3.0;

/// Backwards movement tolerated before a glyph counts as a new line.
const BACKTRACK_TOLERANCE: f32 = 0.5;

/// Two sizes closer than this are the same style.
const SIZE_TOLERANCE: f32 = 0.01;

/// One character as reported by the decoder, with its box in page space (y down).
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bbox: Option<Rect>,
    pub size: f32,
    pub font: String,
    /// Inserted by the decoder (word spaces, line breaks) rather than drawn.
    pub generated: bool,
}

impl Glyph {
    pub fn new(ch: char, bbox: Rect, size: f32, font: impl Into<String>) -> Self {
        Self {
            ch,
            bbox: Some(bbox),
            size,
            font: font.into(),
            generated: false,
        }
    }

    pub fn generated(ch: char) -> Self {
        Self {
            ch,
            bbox: None,
            size: 0.0,
            font: String::new(),
            generated: true,
        }
    }
}

struct OpenSpan {
    bbox: Rect,
    last: Rect,
    text: String,
    size: f32,
    font: String,
}

impl OpenSpan {
    fn into_span(self) -> ExtractedSpan {
        ExtractedSpan::new(self.bbox, self.text, self.size, self.font)
    }
}

struct OpenLine {
    bbox: Rect,
    spans: Vec<ExtractedSpan>,
}

struct OpenBlock {
    last_line: Rect,
    lines: Vec<TextLine>,
}

#[derive(Default)]
struct LayoutBuilder {
    blocks: Vec<TextBlock>,
    block: Option<OpenBlock>,
    line: Option<OpenLine>,
    span: Option<OpenSpan>,
    pending_space: bool,
}

fn same_line(a: &Rect, b: &Rect) -> bool {
    let center_a = (a.y0 + a.y1) / 2.0;
    let center_b = (b.y0 + b.y1) / 2.0;
    (center_a - center_b).abs() <= 0.5 * a.height().max(b.height())
}

fn overlaps_horizontally(a: &Rect, b: &Rect, slack: f32) -> bool {
    b.x0 <= a.x1 + slack && b.x1 >= a.x0 - slack
}

impl LayoutBuilder {
    fn push(&mut self, glyph: Glyph) {
        if glyph.ch == '\n' || glyph.ch == '\r' {
            self.end_line();
            return;
        }

        let bbox = match glyph.bbox {
            Some(bbox) if !glyph.generated => bbox,
            _ => {
                if glyph.ch.is_whitespace() && self.span.is_some() {
                    self.pending_space = true;
                }
                return;
            }
        };

        if let Some(span) = &self.span {
            let em = span.size.max(glyph.size);
            let breaks_line = !same_line(&span.last, &bbox)
                || bbox.x0 < span.last.x0 - BACKTRACK_TOLERANCE
                || bbox.x0 - span.last.x1 > MAX_GAP_EM * em;
            let restyled = span.font != glyph.font || (span.size - glyph.size).abs() > SIZE_TOLERANCE;

            if breaks_line {
                self.end_line();
            } else if restyled {
                self.end_span();
            }
        }

        match &mut self.span {
            Some(span) => {
                if self.pending_space {
                    span.text.push(' ');
                }
                span.text.push(glyph.ch);
                span.bbox = span.bbox.union(&bbox);
                span.last = bbox;
            }
            None => {
                if self.line.is_none() {
                    self.start_line(&bbox, glyph.size);
                }
                self.span = Some(OpenSpan {
                    bbox,
                    last: bbox,
                    text: glyph.ch.to_string(),
                    size: glyph.size,
                    font: glyph.font,
                });
            }
        }
        self.pending_space = false;
    }

    /// Opens a line, first closing the block when the line does not continue it.
    fn start_line(&mut self, first: &Rect, size: f32) {
        if let Some(block) = &self.block {
            let prev = block.last_line;
            let too_far = first.y0 - prev.y1 > prev.height();
            if too_far || !overlaps_horizontally(&prev, first, size) {
                self.end_block();
            }
        }
        if self.block.is_none() {
            self.block = Some(OpenBlock {
                last_line: *first,
                lines: Vec::new(),
            });
        }
        self.line = Some(OpenLine {
            bbox: *first,
            spans: Vec::new(),
        });
    }

    fn end_span(&mut self) {
        self.pending_space = false;
        if let (Some(span), Some(line)) = (self.span.take(), self.line.as_mut()) {
            line.bbox = line.bbox.union(&span.bbox);
            line.spans.push(span.into_span());
        }
    }

    fn end_line(&mut self) {
        self.end_span();
        if let (Some(line), Some(block)) = (self.line.take(), self.block.as_mut()) {
            if !line.spans.is_empty() {
                block.last_line = line.bbox;
                block.lines.push(TextLine { spans: line.spans });
            }
        }
    }

    fn end_block(&mut self) {
        self.end_line();
        if let Some(block) = self.block.take() {
            if !block.lines.is_empty() {
                self.blocks.push(TextBlock { lines: block.lines });
            }
        }
    }

    fn finish(mut self) -> Vec<TextBlock> {
        self.end_block();
        self.blocks
    }
}

/// Groups characters, in content order, into blocks of lines of uniformly styled spans.
pub fn group_glyphs<I>(glyphs: I) -> Vec<TextBlock>
where
    I: IntoIterator<Item = Glyph>,
{
    let mut builder = LayoutBuilder::default();
    for glyph in glyphs {
        builder.push(glyph);
    }
    builder.finish()
}

/// Maps a pdfium rectangle (user space, y up) into the displayed page space.
fn to_page_space(rect: &PdfRect, page_box: &PageBox) -> Rect {
    page_box.rect_to_page(&Rect::new(
        rect.left().value,
        rect.bottom().value,
        rect.right().value,
        rect.top().value,
    ))
}

/// Text source backed by a pdfium document, with page boxes read from the lopdf model.
pub struct PdfiumTextSource<'a> {
    document: PdfDocument<'a>,
    boxes: Vec<PageBox>,
}

impl<'a> PdfiumTextSource<'a> {
    pub fn new(document: PdfDocument<'a>, original: &Document) -> Self {
        let boxes = original
            .get_pages()
            .into_values()
            .map(|page_id| get_page_box(original, page_id))
            .collect();
        Self { document, boxes }
    }
}

impl PdfiumTextSource<'_> {
    fn page_box(&self, index: usize) -> Result<PageBox> {
        self.boxes
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("page {} is out of range", index))
    }
}

impl TextSource for PdfiumTextSource<'_> {
    fn page_count(&self) -> usize {
        self.boxes.len()
    }

    fn page_size(&self, index: usize) -> Result<PageSize> {
        Ok(self.page_box(index)?.size())
    }

    fn page_text(&self, index: usize) -> Result<PageText> {
        let page_box = self.page_box(index)?;
        let page_number = u16::try_from(index).map_err(|_| anyhow!("page {} is out of range", index))?;

        let page = self
            .document
            .pages()
            .get(page_number)
            .map_err(|e| anyhow!("cannot open page: {}", e))?;
        let text = page.text().map_err(|e| anyhow!("cannot read page text: {}", e))?;

        let blocks = group_glyphs(text.chars().iter().filter_map(|c| {
            let ch = c.unicode_char()?;
            Some(Glyph {
                ch,
                bbox: c.loose_bounds().ok().map(|r| to_page_space(&r, &page_box)),
                size: c.scaled_font_size().value,
                font: c.font_name(),
                generated: c.is_generated().unwrap_or(false),
            })
        }));

        Ok(PageText {
            index,
            size: page_box.size(),
            blocks,
        })
    }
}

/// Reads every page before anything is modified. Unreadable pages yield no text
/// but keep their real size.
pub fn extract_pages(source: &dyn TextSource, report: &mut ConversionReport) -> Vec<PageText> {
    let count = source.page_count();
    let mut pages = Vec::with_capacity(count);

    for index in 0..count {
        match source.page_text(index) {
            Ok(page) => {
                log::debug!(
                    "[Extract] page {}: {} blocks, {} spans",
                    index + 1,
                    page.blocks.len(),
                    page.span_count()
                );
                pages.push(page);
            }
            Err(e) => {
                report.warn_page(Stage::Extract, index, format!("{:#}", e));
                let size = source.page_size(index).unwrap_or_else(|size_err| {
                    log::debug!("[Extract] page {} size unknown ({:#}), using Letter", index + 1, size_err);
                    PageSize::default()
                });
                pages.push(PageText::empty(index, size));
            }
        }
    }

    log::info!(
        "[Extract] {} pages, {} spans",
        pages.len(),
        pages.iter().map(PageText::span_count).sum::<usize>()
    );
    pages
}
