//! Glyph advance lookup for estimating where shown text lands on the page.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

use crate::utils::{get_number, inherited_attribute, resolve, resolve_dict};

/// Longest `c1 c2 w` range expanded from a `/W` array.
const MAX_CID_RANGE: u32 = 0xFFFF;

/// Advance widths of one font, in text space units per unit of font size.
#[derive(Debug, Clone, PartialEq)]
pub enum FontMetrics {
    /// Single-byte font with a `/Widths` table.
    Simple {
        first_char: i64,
        widths: Vec<f32>,
        missing: f32,
    },
    /// Two-byte CID font: per-CID widths from `/W`, `/DW` for the rest.
    /// Codes are taken as CIDs (Identity encodings).
    Composite {
        default_width: f32,
        widths: HashMap<u32, f32>,
    },
    /// Nothing usable in the font dictionary.
    Unknown,
}

impl FontMetrics {
    pub fn from_font_dict(doc: &Document, font: &Dictionary) -> Self {
        let subtype = font.get(b"Subtype").ok().and_then(|o| o.as_name().ok());
        if subtype == Some(b"Type0".as_slice()) {
            let descendant = font
                .get(b"DescendantFonts")
                .ok()
                .and_then(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|o| resolve_dict(doc, o));
            let default_width = descendant
                .and_then(|d| d.get(b"DW").ok())
                .and_then(|o| resolve(doc, o))
                .and_then(get_number)
                .unwrap_or(1000.0);
            let widths = descendant
                .and_then(|d| d.get(b"W").ok())
                .and_then(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
                .map(|w| cid_widths(doc, w))
                .unwrap_or_default();
            return FontMetrics::Composite {
                default_width: default_width / 1000.0,
                widths,
            };
        }
        if subtype == Some(b"Type3".as_slice()) {
            return FontMetrics::Unknown;
        }

        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok());
        let first_char = font.get(b"FirstChar").ok().and_then(|o| o.as_i64().ok());

        match (widths, first_char) {
            (Some(widths), Some(first_char)) => {
                let missing = font
                    .get(b"FontDescriptor")
                    .ok()
                    .and_then(|o| resolve_dict(doc, o))
                    .and_then(|d| d.get(b"MissingWidth").ok())
                    .and_then(get_number)
                    .unwrap_or(0.0);
                FontMetrics::Simple {
                    first_char,
                    widths: widths
                        .iter()
                        .map(|w| resolve(doc, w).and_then(get_number).unwrap_or(0.0) / 1000.0)
                        .collect(),
                    missing: missing / 1000.0,
                }
            }
            _ => FontMetrics::Unknown,
        }
    }

    pub fn bytes_per_code(&self) -> usize {
        match self {
            FontMetrics::Composite { .. } => 2,
            _ => 1,
        }
    }

    /// Advance of a single character code, before font size and spacing apply.
    pub fn code_width(&self, code: u32) -> f32 {
        match self {
            FontMetrics::Simple {
                first_char,
                widths,
                missing,
            } => {
                let index = i64::from(code) - first_char;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| widths.get(i))
                    .copied()
                    .unwrap_or(*missing)
            }
            FontMetrics::Composite { default_width, widths } => {
                widths.get(&code).copied().unwrap_or(*default_width)
            }
            FontMetrics::Unknown => {
                if code < 128 {
                    0.55
                } else {
                    1.0
                }
            }
        }
    }

    /// Splits a shown string into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        match self.bytes_per_code() {
            2 => bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
                .collect(),
            _ => bytes.iter().map(|b| u32::from(*b)).collect(),
        }
    }
}

/// Reads a CID font `/W` array: `c [w1 w2 ...]` runs and `c1 c2 w` ranges.
fn cid_widths(doc: &Document, w: &[Object]) -> HashMap<u32, f32> {
    let cid = |o: &Object| o.as_i64().ok().and_then(|c| u32::try_from(c).ok());
    let mut widths = HashMap::new();
    let mut items = w.iter().filter_map(|o| resolve(doc, o));

    while let Some(first) = items.next() {
        let Some(start) = cid(first) else { break };
        match items.next() {
            Some(Object::Array(run)) => {
                for (offset, width) in (0u32..).zip(run.iter()) {
                    if let Some(width) = resolve(doc, width).and_then(get_number) {
                        widths.insert(start.saturating_add(offset), width / 1000.0);
                    }
                }
            }
            Some(last) => {
                let Some(end) = cid(last) else { break };
                let Some(width) = items.next().and_then(get_number) else { break };
                let end = end.min(start.saturating_add(MAX_CID_RANGE));
                for code in start..=end {
                    widths.insert(code, width / 1000.0);
                }
            }
            None => break,
        }
    }
    widths
}

/// Fonts reachable from a page's `/Resources`, keyed by resource name.
#[derive(Debug, Clone, Default)]
pub struct FontTable {
    fonts: HashMap<Vec<u8>, FontMetrics>,
}

impl FontTable {
    pub fn for_page(doc: &Document, page_id: ObjectId) -> Self {
        match inherited_attribute(doc, page_id, b"Resources").and_then(|o| resolve_dict(doc, o)) {
            Some(resources) => Self::from_resources(doc, resources),
            None => Self::default(),
        }
    }

    /// Fonts of a resource dictionary (a page's or a form's).
    pub fn from_resources(doc: &Document, resources: &Dictionary) -> Self {
        let mut fonts = HashMap::new();
        let font_dict = resources.get(b"Font").ok().and_then(|o| resolve_dict(doc, o));

        if let Some(font_dict) = font_dict {
            for (name, obj) in font_dict.iter() {
                if let Some(font) = resolve_dict(doc, obj) {
                    fonts.insert(name.clone(), FontMetrics::from_font_dict(doc, font));
                }
            }
        }
        log::debug!("[Fonts] {} font resources", fonts.len());
        Self { fonts }
    }

    pub fn get(&self, name: &[u8]) -> &FontMetrics {
        static UNKNOWN: FontMetrics = FontMetrics::Unknown;
        self.fonts.get(name).unwrap_or(&UNKNOWN)
    }
}
