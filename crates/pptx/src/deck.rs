//! In-memory slide deck model.

use chrono::{DateTime, Utc};

use pagedeck_core::geometry::{points_to_emu, EmuSize};
use pagedeck_core::span::TextSpan;

/// A picture stretched over the whole slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub png: Vec<u8>,
}

/// A borderless, unfilled, non-wrapping text box holding a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBox {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    pub text: String,
    pub size_pt: u32,
    pub bold: bool,
}

impl TextBox {
    /// Places a validated span, positions converted from points to EMU.
    pub fn from_span(span: &TextSpan) -> Self {
        Self {
            x: points_to_emu(span.bbox.x0),
            y: points_to_emu(span.bbox.y0),
            cx: points_to_emu(span.bbox.width()),
            cy: points_to_emu(span.bbox.height()),
            text: span.text.clone(),
            size_pt: span.point_size(),
            bold: span.is_bold,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slide {
    pub background: Option<Picture>,
    pub text_boxes: Vec<TextBox>,
}

#[derive(Debug, Clone)]
pub struct Deck {
    pub size: EmuSize,
    pub slides: Vec<Slide>,
    pub title: Option<String>,
    pub created: DateTime<Utc>,
}

impl Deck {
    pub fn new(size: EmuSize) -> Self {
        Self {
            size,
            slides: Vec::new(),
            title: None,
            created: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn push(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    pub fn text_box_count(&self) -> usize {
        self.slides.iter().map(|s| s.text_boxes.len()).sum()
    }
}
