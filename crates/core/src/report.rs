//! Conversion outcome: counts plus every recovered failure.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::options::ConversionKind;

/// Pipeline stage a warning was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Redact,
    Rasterize,
    Place,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Redact => "redact",
            Stage::Rasterize => "rasterize",
            Stage::Place => "place",
        };
        f.write_str(name)
    }
}

/// A page- or span-level failure that was recovered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionWarning {
    pub stage: Stage,
    /// Zero-based page index.
    pub page: usize,
    /// Span index within the page, for span-level failures.
    pub span: Option<usize>,
    pub message: String,
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(
                f,
                "[{}] page {} span {}: {}",
                self.stage,
                self.page + 1,
                span,
                self.message
            ),
            None => write!(f, "[{}] page {}: {}", self.stage, self.page + 1, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub kind: ConversionKind,
    pub pages: usize,
    pub slides: usize,
    pub text_boxes: usize,
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionReport {
    pub fn new(kind: ConversionKind, pages: usize) -> Self {
        Self {
            kind,
            pages,
            ..Self::default()
        }
    }

    /// Records and logs a page-level warning.
    pub fn warn_page(&mut self, stage: Stage, page: usize, message: impl Into<String>) {
        self.push(ConversionWarning {
            stage,
            page,
            span: None,
            message: message.into(),
        });
    }

    /// Records and logs a span-level warning.
    pub fn warn_span(&mut self, stage: Stage, page: usize, span: usize, message: impl Into<String>) {
        self.push(ConversionWarning {
            stage,
            page,
            span: Some(span),
            message: message.into(),
        });
    }

    fn push(&mut self, warning: ConversionWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings_for(&self, stage: Stage) -> impl Iterator<Item = &ConversionWarning> + '_ {
        self.warnings.iter().filter(move |w| w.stage == stage)
    }
}
