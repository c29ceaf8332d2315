//! Conversion options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConvertError;

/// DPI used when a caller does not pick one.
pub const DEFAULT_DPI: u32 = 150;

/// Expansion applied to every span box before it is erased from the background.
pub const DEFAULT_REDACTION_MARGIN: f32 = 2.0;

/// Supported conversion strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    /// Editable text boxes over a text-free rasterized background.
    #[default]
    Hybrid,
    /// Every page flattened into a single picture.
    ImageOnly,
}

impl ConversionKind {
    /// Tag used to prefix failure messages.
    pub fn label(&self) -> &'static str {
        match self {
            ConversionKind::Hybrid => "Hybrid",
            ConversionKind::ImageOnly => "Image-only",
        }
    }
}

/// Coarse background quality selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Fast,
    #[default]
    Good,
    High,
}

impl Quality {
    pub fn dpi(&self) -> u32 {
        match self {
            Quality::Fast => 96,
            Quality::Good => 120,
            Quality::High => 150,
        }
    }

    /// Parses a selector name; anything unknown falls back to `Good`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "fast" => Quality::Fast,
            "high" => Quality::High,
            _ => Quality::Good,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub kind: ConversionKind,
    /// Background rasterization resolution.
    pub dpi: u32,
    /// Margin (points) added around each span before erasing it.
    pub redaction_margin: f32,
    /// Directory holding the PDFium shared library, if not on the default search path.
    pub pdfium_dir: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            kind: ConversionKind::default(),
            dpi: DEFAULT_DPI,
            redaction_margin: DEFAULT_REDACTION_MARGIN,
            pdfium_dir: None,
        }
    }
}

impl ConvertOptions {
    pub fn with_kind(mut self, kind: ConversionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_quality(self, quality: Quality) -> Self {
        self.with_dpi(quality.dpi())
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.dpi == 0 {
            return Err(ConvertError::InvalidOptions("dpi must be positive".into()));
        }
        if !self.redaction_margin.is_finite() || self.redaction_margin < 0.0 {
            return Err(ConvertError::InvalidOptions(format!(
                "redaction margin must be a non-negative number, got {}",
                self.redaction_margin
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_dpi() {
        assert_eq!(Quality::Fast.dpi(), 96);
        assert_eq!(Quality::Good.dpi(), 120);
        assert_eq!(Quality::High.dpi(), 150);
        assert_eq!(Quality::from_name("HIGH"), Quality::High);
        assert_eq!(Quality::from_name("ultra"), Quality::Good);
    }

    #[test]
    fn test_default_options() {
        let options = ConvertOptions::default();
        assert_eq!(options.kind, ConversionKind::Hybrid);
        assert_eq!(options.dpi, 150);
        assert_eq!(options.redaction_margin, 2.0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_dpi() {
        let options = ConvertOptions::default().with_dpi(0);
        assert!(matches!(options.validate(), Err(ConvertError::InvalidOptions(_))));
    }

    #[test]
    fn test_options_serde() {
        let options: ConvertOptions =
            serde_json::from_str(r#"{"kind":"image_only","dpi":96}"#).unwrap();
        assert_eq!(options.kind, ConversionKind::ImageOnly);
        assert_eq!(options.dpi, 96);
        assert_eq!(options.redaction_margin, DEFAULT_REDACTION_MARGIN);
    }
}
