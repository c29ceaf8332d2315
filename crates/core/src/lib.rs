//! Shared data model for page-to-slide conversion.
//!
//! Holds the geometry and unit conversions, the extracted text model, the
//! conversion options and report, and the traits the PDF and rendering
//! backends implement.

pub mod document;
pub mod error;
pub mod geometry;
pub mod options;
pub mod report;
pub mod span;

pub use document::{Converter, PageImage, PageRasterizer, ProgressFn, TextSource};
pub use error::ConvertError;
pub use geometry::{points_to_emu, EmuSize, PageSize, Rect, POINTS_TO_EMU};
pub use options::{ConversionKind, ConvertOptions, Quality};
pub use report::{ConversionReport, ConversionWarning, Stage};
pub use span::{
    is_bold_font, ExtractedSpan, PageSpans, PageText, SpanError, TextBlock, TextLine, TextSpan, MAX_FONT_POINTS,
};

pub type Result<T> = std::result::Result<T, ConvertError>;
