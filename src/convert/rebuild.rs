//! Slide rebuilding: one slide per page, background picture first, then text boxes.

use pagedeck_core::geometry::{EmuSize, PageSize};
use pagedeck_core::{ConversionReport, ConvertError, PageRasterizer, PageSpans, PageText, ProgressFn, Stage};
use pagedeck_pptx::{Deck, Picture, Slide, TextBox};

/// Fixed 16 in x 9 in slide used for flattened decks.
pub const WIDESCREEN: EmuSize = EmuSize::new(14_630_400, 8_229_600);

/// Slide size from the first clean page, else the first extracted page.
fn deck_size(pages: &[PageSpans], rasterizer: &dyn PageRasterizer, report: &mut ConversionReport) -> EmuSize {
    let size = match rasterizer.page_size(0) {
        Ok(size) => size,
        Err(e) => {
            let fallback = pages.first().map(|p| p.size).unwrap_or_default();
            report.warn_page(
                Stage::Rasterize,
                0,
                format!("cannot read page size ({:#}); using {}x{} pt", e, fallback.width, fallback.height),
            );
            fallback
        }
    };
    log::info!("[Rebuild] slide size {}x{} pt", size.width, size.height);
    size.to_emu()
}

fn background(
    rasterizer: &dyn PageRasterizer,
    index: usize,
    dpi: u32,
    report: &mut ConversionReport,
) -> Option<Picture> {
    match rasterizer.rasterize(index, dpi) {
        Ok(image) => {
            log::debug!(
                "[Rebuild] page {}: background {}x{} px",
                index + 1,
                image.width,
                image.height
            );
            Some(Picture { png: image.png })
        }
        Err(e) => {
            report.warn_page(
                Stage::Rasterize,
                index,
                format!("{:#}; slide has no background", e),
            );
            None
        }
    }
}

/// Validates every extracted span once. The accepted spans are both what gets
/// redacted from the background and what becomes a text box; a rejected span
/// stays in the background.
pub fn accept_spans(pages: &[PageText], report: &mut ConversionReport) -> Vec<PageSpans> {
    pages
        .iter()
        .map(|page| {
            let (accepted, rejected) = PageSpans::validate(page);
            for (i, e) in rejected {
                report.warn_span(Stage::Place, page.index, i, format!("{}; left in the background", e));
            }
            accepted
        })
        .collect()
}

fn commit(
    deck: &mut Deck,
    slide: Slide,
    done: usize,
    total: usize,
    progress: &mut ProgressFn<'_>,
    report: &mut ConversionReport,
) -> Result<(), ConvertError> {
    report.slides += 1;
    report.text_boxes += slide.text_boxes.len();
    deck.push(slide);
    progress(done, total).map_err(|e| ConvertError::Progress(format!("{:#}", e)))
}

/// Builds the hybrid deck: clean background plus re-typeset text for every page.
///
/// `pages` and `rasterizer` describe the same document; the rasterizer
/// renders the working copy the same spans were redacted from.
pub fn rebuild_deck(
    pages: &[PageSpans],
    rasterizer: &dyn PageRasterizer,
    dpi: u32,
    progress: &mut ProgressFn<'_>,
    report: &mut ConversionReport,
) -> Result<Deck, ConvertError> {
    let mut deck = Deck::new(deck_size(pages, rasterizer, report));
    let total = pages.len();

    for (index, page) in pages.iter().enumerate() {
        let slide = Slide {
            background: background(rasterizer, index, dpi, report),
            text_boxes: page.spans.iter().map(TextBox::from_span).collect(),
        };
        log::debug!(
            "[Rebuild] page {}/{}: {} text boxes",
            index + 1,
            total,
            slide.text_boxes.len()
        );
        commit(&mut deck, slide, index + 1, total, progress, report)?;
    }

    Ok(deck)
}

/// Builds a flattened deck: every page as a single picture on a widescreen slide.
pub fn flatten_deck(
    rasterizer: &dyn PageRasterizer,
    dpi: u32,
    progress: &mut ProgressFn<'_>,
    report: &mut ConversionReport,
) -> Result<Deck, ConvertError> {
    let mut deck = Deck::new(WIDESCREEN);
    let total = rasterizer.page_count();

    for index in 0..total {
        let slide = Slide {
            background: background(rasterizer, index, dpi, report),
            text_boxes: Vec::new(),
        };
        commit(&mut deck, slide, index + 1, total, progress, report)?;
    }

    Ok(deck)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use pagedeck_core::geometry::Rect;
    use pagedeck_core::{ConversionKind, ExtractedSpan, PageImage, TextBlock, TextLine};
    use std::cell::RefCell;

    /// Rasterizer over fixed page sizes; pages listed in `failing` cannot be rendered.
    pub(crate) struct FakeRasterizer {
        pub sizes: Vec<PageSize>,
        pub failing: Vec<usize>,
        pub rendered: RefCell<Vec<(usize, u32)>>,
    }

    impl FakeRasterizer {
        pub fn new(sizes: Vec<PageSize>) -> Self {
            Self {
                sizes,
                failing: Vec::new(),
                rendered: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageRasterizer for FakeRasterizer {
        fn page_count(&self) -> usize {
            self.sizes.len()
        }

        fn page_size(&self, index: usize) -> Result<PageSize> {
            self.sizes.get(index).copied().ok_or_else(|| anyhow!("no page {}", index))
        }

        fn rasterize(&self, index: usize, dpi: u32) -> Result<PageImage> {
            if self.failing.contains(&index) {
                return Err(anyhow!("renderer crashed"));
            }
            self.rendered.borrow_mut().push((index, dpi));
            let (width, height) = self.page_size(index)?.pixels_at(dpi);
            Ok(PageImage {
                page: index,
                width,
                height,
                png: format!("png-{}", index).into_bytes(),
            })
        }
    }

    fn letter() -> PageSize {
        PageSize::new(612.0, 792.0)
    }

    fn accepted(pages: &[PageText]) -> Vec<PageSpans> {
        let mut report = ConversionReport::new(ConversionKind::Hybrid, pages.len());
        let accepted = accept_spans(pages, &mut report);
        assert!(report.warnings.is_empty());
        accepted
    }

    pub(crate) fn hello_pages() -> Vec<PageText> {
        vec![
            PageText {
                index: 0,
                size: letter(),
                blocks: vec![TextBlock {
                    lines: vec![TextLine {
                        spans: vec![ExtractedSpan::new(
                            Rect::new(72.0, 72.0, 200.0, 90.0),
                            "Hello",
                            18.0,
                            "Arial-Bold",
                        )],
                    }],
                }],
            },
            PageText::empty(1, letter()),
        ]
    }

    #[test]
    fn test_two_page_deck() {
        let rasterizer = FakeRasterizer::new(vec![letter(), letter()]);
        let mut report = ConversionReport::new(ConversionKind::Hybrid, 2);
        let mut calls = Vec::new();
        let mut progress = |done: usize, total: usize| -> Result<()> {
            calls.push((done, total));
            Ok(())
        };

        let deck = rebuild_deck(&accepted(&hello_pages()), &rasterizer, 150, &mut progress, &mut report).unwrap();

        assert_eq!(deck.size, EmuSize::new(7_772_400, 10_058_400));
        assert_eq!(deck.slides.len(), 2);
        assert_eq!(calls, vec![(1, 2), (2, 2)]);
        assert_eq!(*rasterizer.rendered.borrow(), vec![(0, 150), (1, 150)]);

        let hello = &deck.slides[0].text_boxes[0];
        assert_eq!((hello.x, hello.y, hello.cx, hello.cy), (914_400, 914_400, 1_625_600, 228_600));
        assert_eq!(hello.size_pt, 18);
        assert!(hello.bold);

        assert!(deck.slides[1].background.is_some());
        assert!(deck.slides[1].text_boxes.is_empty());
        assert_eq!((report.slides, report.text_boxes), (2, 1));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_malformed_span_skipped() {
        let mut pages = hello_pages();
        pages[0].blocks[0].lines[0].spans.insert(
            0,
            ExtractedSpan {
                text: Some("no box".to_string()),
                size: Some(12.0),
                ..ExtractedSpan::default()
            },
        );
        let rasterizer = FakeRasterizer::new(vec![letter(), letter()]);
        let mut report = ConversionReport::new(ConversionKind::Hybrid, 2);
        let mut progress = |_: usize, _: usize| -> Result<()> { Ok(()) };

        let accepted = accept_spans(&pages, &mut report);
        assert_eq!(accepted[0].spans.len(), 1);
        let deck = rebuild_deck(&accepted, &rasterizer, 96, &mut progress, &mut report).unwrap();

        assert_eq!(deck.slides.len(), 2);
        assert_eq!(deck.slides[0].text_boxes.len(), 1);
        assert_eq!(deck.slides[0].text_boxes[0].text, "Hello");
        let warnings: Vec<_> = report.warnings_for(Stage::Place).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!((warnings[0].page, warnings[0].span), (0, Some(0)));
    }

    #[test]
    fn test_failed_background_keeps_slide() {
        let mut rasterizer = FakeRasterizer::new(vec![letter(), letter()]);
        rasterizer.failing = vec![0];
        let mut report = ConversionReport::new(ConversionKind::Hybrid, 2);
        let mut calls = 0;
        let mut progress = |_: usize, _: usize| -> Result<()> {
            calls += 1;
            Ok(())
        };

        let deck = rebuild_deck(&accepted(&hello_pages()), &rasterizer, 150, &mut progress, &mut report).unwrap();

        assert_eq!(deck.slides.len(), 2);
        assert!(deck.slides[0].background.is_none());
        assert_eq!(deck.slides[0].text_boxes.len(), 1);
        assert!(deck.slides[1].background.is_some());
        assert_eq!(calls, 2);
        assert_eq!(report.warnings_for(Stage::Rasterize).count(), 1);
    }

    #[test]
    fn test_progress_error_aborts() {
        let rasterizer = FakeRasterizer::new(vec![letter(), letter()]);
        let mut report = ConversionReport::new(ConversionKind::Hybrid, 2);
        let mut progress = |done: usize, _: usize| -> Result<()> {
            if done == 1 {
                return Err(anyhow!("cancelled by user"));
            }
            Ok(())
        };

        let err = rebuild_deck(&accepted(&hello_pages()), &rasterizer, 150, &mut progress, &mut report).unwrap_err();
        assert!(matches!(err, ConvertError::Progress(ref msg) if msg.contains("cancelled by user")));
        assert_eq!(rasterizer.rendered.borrow().len(), 1);
    }

    #[test]
    fn test_size_falls_back_to_extracted_page() {
        let rasterizer = FakeRasterizer::new(Vec::new());
        let mut report = ConversionReport::new(ConversionKind::Hybrid, 1);
        let pages = vec![PageSpans::empty(0, PageSize::new(720.0, 405.0))];
        let mut progress = |_: usize, _: usize| -> Result<()> { Ok(()) };

        let deck = rebuild_deck(&pages, &rasterizer, 150, &mut progress, &mut report).unwrap();
        assert_eq!(deck.size, EmuSize::new(9_144_000, 5_143_500));
        assert_eq!(deck.slides.len(), 1);
        assert!(deck.slides[0].background.is_none());
    }

    #[test]
    fn test_flatten_deck() {
        let rasterizer = FakeRasterizer::new(vec![letter(), letter(), letter()]);
        let mut report = ConversionReport::new(ConversionKind::ImageOnly, 3);
        let mut calls = Vec::new();
        let mut progress = |done: usize, total: usize| -> Result<()> {
            calls.push((done, total));
            Ok(())
        };

        let deck = flatten_deck(&rasterizer, 120, &mut progress, &mut report).unwrap();

        assert_eq!(deck.size, WIDESCREEN);
        assert_eq!(deck.slides.len(), 3);
        assert!(deck.slides.iter().all(|s| s.background.is_some() && s.text_boxes.is_empty()));
        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(report.text_boxes, 0);
    }
}
