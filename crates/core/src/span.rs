//! Extracted text model: pages → blocks → lines → spans.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{PageSize, Rect};

/// How far a span may stick out of its page before it is clipped to it.
const PAGE_TOLERANCE: f32 = 1.0;

/// Largest size, in whole points, a re-typeset run may have.
pub const MAX_FONT_POINTS: u32 = 4000;

/// Raw record for one run of uniformly styled text, as produced by a decoder.
///
/// Every field is optional: a decoder may fail to report any of them and the
/// record still travels through the pipeline. Validation happens when a
/// consumer turns it into a [`TextSpan`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSpan {
    pub bbox: Option<Rect>,
    pub text: Option<String>,
    pub size: Option<f32>,
    pub font: Option<String>,
}

impl ExtractedSpan {
    pub fn new(bbox: Rect, text: impl Into<String>, size: f32, font: impl Into<String>) -> Self {
        Self {
            bbox: Some(bbox),
            text: Some(text.into()),
            size: Some(size),
            font: Some(font.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub spans: Vec<ExtractedSpan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

/// Structured text of one page, captured before the page is modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// Zero-based page index.
    pub index: usize,
    pub size: PageSize,
    pub blocks: Vec<TextBlock>,
}

impl PageText {
    /// A page that contributes no text.
    pub fn empty(index: usize, size: PageSize) -> Self {
        Self {
            index,
            size,
            blocks: Vec::new(),
        }
    }

    /// All spans in block → line → span order.
    pub fn spans(&self) -> impl Iterator<Item = &ExtractedSpan> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter())
            .flat_map(|line| line.spans.iter())
    }

    pub fn span_count(&self) -> usize {
        self.spans().count()
    }
}

/// Characters XML 1.0 can carry.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
}

/// Case-insensitive "bold" check on a font name.
pub fn is_bold_font(font_name: &str) -> bool {
    font_name.to_lowercase().contains("bold")
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpanError {
    #[error("span has no bounding box")]
    MissingBbox,
    #[error("span has no text")]
    MissingText,
    #[error("span has no font size")]
    MissingSize,
    #[error("span text is empty")]
    EmptyText,
    #[error("invalid font size: {0}")]
    InvalidSize(f32),
    #[error("degenerate bounding box: {0:?}")]
    DegenerateBbox(Rect),
    #[error("bounding box {bbox:?} lies outside the {width}x{height} page")]
    OutsidePage { bbox: Rect, width: f32, height: f32 },
    #[error("text cannot be placed: {0}")]
    Unplaceable(String),
}

/// A validated, re-typesettable run of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub bbox: Rect,
    pub text: String,
    pub font_size: f32,
    pub is_bold: bool,
}

impl TextSpan {
    /// Validates a raw record against the page it was extracted from.
    ///
    /// A box overhanging the page is clipped to it, characters a slide cannot
    /// hold are dropped and oversized text is capped at [`MAX_FONT_POINTS`].
    pub fn from_extracted(span: &ExtractedSpan, page: PageSize) -> Result<Self, SpanError> {
        let bbox = span.bbox.ok_or(SpanError::MissingBbox)?;
        let raw_text = span.text.as_deref().ok_or(SpanError::MissingText)?;
        let font_size = span.size.ok_or(SpanError::MissingSize)?;

        if raw_text.is_empty() {
            return Err(SpanError::EmptyText);
        }
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(SpanError::InvalidSize(font_size));
        }
        if bbox.is_degenerate() {
            return Err(SpanError::DegenerateBbox(bbox));
        }

        let bounds = page.bounds();
        let bbox = if bounds.contains(&bbox, PAGE_TOLERANCE) {
            bbox
        } else {
            let clipped = bbox.intersection(&bounds);
            if clipped.is_degenerate() {
                return Err(SpanError::OutsidePage {
                    bbox,
                    width: page.width,
                    height: page.height,
                });
            }
            clipped
        };

        let text: String = raw_text.chars().filter(|c| is_xml_char(*c)).collect();
        if text.trim().is_empty() {
            return Err(SpanError::Unplaceable("text has no printable characters".to_string()));
        }

        Ok(Self {
            bbox,
            text,
            font_size: font_size.min(MAX_FONT_POINTS as f32),
            is_bold: span.font.as_deref().is_some_and(is_bold_font),
        })
    }

    /// Whole point size used when the span is re-typeset.
    pub fn point_size(&self) -> u32 {
        self.font_size.round().max(1.0) as u32
    }
}

/// The spans of one page accepted for re-typesetting.
///
/// Redaction erases exactly this set from the background, so a span rejected
/// here stays visible in the raster instead of disappearing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpans {
    pub index: usize,
    pub size: PageSize,
    pub spans: Vec<TextSpan>,
}

impl PageSpans {
    pub fn empty(index: usize, size: PageSize) -> Self {
        Self {
            index,
            size,
            spans: Vec::new(),
        }
    }

    /// Validates every span of `page`, returning the rejects with their
    /// position in block, line, span order.
    pub fn validate(page: &PageText) -> (Self, Vec<(usize, SpanError)>) {
        let mut accepted = Self::empty(page.index, page.size);
        let mut rejected = Vec::new();
        for (i, span) in page.spans().enumerate() {
            match TextSpan::from_extracted(span, page.size) {
                Ok(span) => accepted.spans.push(span),
                Err(e) => rejected.push((i, e)),
            }
        }
        (accepted, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageSize {
        PageSize::new(612.0, 792.0)
    }

    #[test]
    fn test_bold_detection() {
        assert!(is_bold_font("Arial-Bold"));
        assert!(is_bold_font("ABCDEE+Helvetica-BOLDOblique"));
        assert!(is_bold_font("bold"));
        assert!(!is_bold_font("Arial"));
        assert!(!is_bold_font("Times-Italic"));
        assert!(!is_bold_font("Bol-d"));
    }

    #[test]
    fn test_from_extracted() {
        let raw = ExtractedSpan::new(Rect::new(72.0, 72.0, 200.0, 90.0), "Hello", 18.0, "Arial-Bold");
        let span = TextSpan::from_extracted(&raw, page()).unwrap();
        assert_eq!(span.text, "Hello");
        assert!(span.is_bold);
        assert_eq!(span.point_size(), 18);
    }

    #[test]
    fn test_missing_fields() {
        let mut raw = ExtractedSpan::new(Rect::new(72.0, 72.0, 200.0, 90.0), "Hello", 18.0, "Arial");
        raw.bbox = None;
        assert_eq!(TextSpan::from_extracted(&raw, page()), Err(SpanError::MissingBbox));

        let raw = ExtractedSpan {
            bbox: Some(Rect::new(72.0, 72.0, 200.0, 90.0)),
            text: Some("x".into()),
            size: None,
            font: None,
        };
        assert_eq!(TextSpan::from_extracted(&raw, page()), Err(SpanError::MissingSize));
    }

    #[test]
    fn test_missing_font_is_not_bold() {
        let raw = ExtractedSpan {
            font: None,
            ..ExtractedSpan::new(Rect::new(1.0, 1.0, 20.0, 12.0), "x", 10.4, "")
        };
        let span = TextSpan::from_extracted(&raw, page()).unwrap();
        assert!(!span.is_bold);
        assert_eq!(span.point_size(), 10);
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let degenerate = ExtractedSpan::new(Rect::new(72.0, 72.0, 72.0, 90.0), "x", 12.0, "Arial");
        assert!(matches!(
            TextSpan::from_extracted(&degenerate, page()),
            Err(SpanError::DegenerateBbox(_))
        ));

        let outside = ExtractedSpan::new(Rect::new(700.0, 72.0, 720.0, 90.0), "x", 12.0, "Arial");
        assert!(matches!(
            TextSpan::from_extracted(&outside, page()),
            Err(SpanError::OutsidePage { .. })
        ));

        let zero_size = ExtractedSpan::new(Rect::new(72.0, 72.0, 80.0, 90.0), "x", 0.0, "Arial");
        assert_eq!(
            TextSpan::from_extracted(&zero_size, page()),
            Err(SpanError::InvalidSize(0.0))
        );
    }

    #[test]
    fn test_spans_order() {
        let a = ExtractedSpan::new(Rect::new(0.0, 0.0, 1.0, 1.0), "a", 1.0, "f");
        let b = ExtractedSpan::new(Rect::new(0.0, 0.0, 1.0, 1.0), "b", 1.0, "f");
        let c = ExtractedSpan::new(Rect::new(0.0, 0.0, 1.0, 1.0), "c", 1.0, "f");
        let page = PageText {
            index: 0,
            size: page(),
            blocks: vec![
                TextBlock {
                    lines: vec![
                        TextLine { spans: vec![a] },
                        TextLine { spans: vec![b] },
                    ],
                },
                TextBlock {
                    lines: vec![TextLine { spans: vec![c] }],
                },
            ],
        };
        let texts: Vec<_> = page.spans().filter_map(|s| s.text.as_deref()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert_eq!(page.span_count(), 3);
    }

    #[test]
    fn test_overhanging_span_clipped() {
        let raw = ExtractedSpan::new(Rect::new(560.0, 72.0, 614.0, 90.0), "Hello", 18.0, "Arial");
        let span = TextSpan::from_extracted(&raw, page()).unwrap();
        assert_eq!(span.bbox, Rect::new(560.0, 72.0, 612.0, 90.0));

        // within tolerance: kept as extracted
        let raw = ExtractedSpan::new(Rect::new(560.0, 72.0, 612.5, 90.0), "Hello", 18.0, "Arial");
        assert_eq!(TextSpan::from_extracted(&raw, page()).unwrap().bbox, raw.bbox.unwrap());
    }

    #[test]
    fn test_text_sanitized() {
        let raw = ExtractedSpan::new(Rect::new(72.0, 72.0, 200.0, 90.0), "ab\u{1}c\tx", 12.0, "Arial");
        assert_eq!(TextSpan::from_extracted(&raw, page()).unwrap().text, "abc\tx");

        let raw = ExtractedSpan::new(Rect::new(72.0, 72.0, 200.0, 90.0), "\u{2}\u{3}", 12.0, "Arial");
        assert!(matches!(
            TextSpan::from_extracted(&raw, page()),
            Err(SpanError::Unplaceable(_))
        ));
    }

    #[test]
    fn test_huge_size_capped() {
        let raw = ExtractedSpan::new(Rect::new(0.0, 0.0, 600.0, 700.0), "W", 5000.0, "Arial");
        let span = TextSpan::from_extracted(&raw, page()).unwrap();
        assert_eq!(span.point_size(), MAX_FONT_POINTS);
    }

    #[test]
    fn test_validate_page() {
        let good = ExtractedSpan::new(Rect::new(72.0, 72.0, 200.0, 90.0), "Hello", 18.0, "Arial");
        let flat = ExtractedSpan::new(Rect::new(72.0, 100.0, 72.0, 110.0), "x", 12.0, "Arial");
        let page = PageText {
            index: 3,
            size: page(),
            blocks: vec![TextBlock {
                lines: vec![TextLine { spans: vec![flat, good] }],
            }],
        };

        let (accepted, rejected) = PageSpans::validate(&page);
        assert_eq!(accepted.index, 3);
        assert_eq!(accepted.spans.len(), 1);
        assert_eq!(accepted.spans[0].text, "Hello");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, 0);
        assert!(matches!(rejected[0].1, SpanError::DegenerateBbox(_)));
    }
}
