//! Page geometry and the points → EMU conversion.

use serde::{Deserialize, Serialize};

/// 1 PDF point = 12,700 EMU (914,400 EMU per inch / 72 points per inch).
pub const POINTS_TO_EMU: i64 = 12_700;

/// PDF user space resolution.
pub const POINTS_PER_INCH: f32 = 72.0;

/// US Letter, used when a page declares no usable box.
pub const LETTER: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

/// Converts a length in points to the nearest whole EMU.
pub fn points_to_emu(points: f32) -> i64 {
    (f64::from(points) * POINTS_TO_EMU as f64).round() as i64
}

/// Axis-aligned rectangle in page space (points, origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// True when the box has no area (or is not a box at all).
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Grows the rectangle by `margin` on all four sides.
    pub fn expand(&self, margin: f32) -> Rect {
        Rect {
            x0: self.x0 - margin,
            y0: self.y0 - margin,
            x1: self.x1 + margin,
            y1: self.y1 + margin,
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Overlap of two rectangles; degenerate when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }

    /// `other` lies inside `self`, allowing `tolerance` of overshoot on each side.
    pub fn contains(&self, other: &Rect, tolerance: f32) -> bool {
        other.x0 >= self.x0 - tolerance
            && other.y0 >= self.y0 - tolerance
            && other.x1 <= self.x1 + tolerance
            && other.y1 <= self.y1 + tolerance
    }
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn to_emu(&self) -> EmuSize {
        EmuSize {
            cx: points_to_emu(self.width),
            cy: points_to_emu(self.height),
        }
    }

    /// Pixel dimensions of a raster of this page at `dpi`.
    pub fn pixels_at(&self, dpi: u32) -> (u32, u32) {
        let scale = dpi as f32 / POINTS_PER_INCH;
        let width = (self.width * scale).round().max(1.0) as u32;
        let height = (self.height * scale).round().max(1.0) as u32;
        (width, height)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        LETTER
    }
}

/// A width/height pair in English Metric Units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmuSize {
    pub cx: i64,
    pub cy: i64,
}

impl EmuSize {
    pub const fn new(cx: i64, cy: i64) -> Self {
        Self { cx, cy }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_to_emu() {
        assert_eq!(points_to_emu(72.0), 914_400);
        assert_eq!(points_to_emu(128.0), 1_625_600);
        assert_eq!(points_to_emu(18.0), 228_600);
        assert_eq!(points_to_emu(0.5), 6_350);
    }

    #[test]
    fn test_page_size_to_emu() {
        let size = PageSize::new(720.0, 405.0);
        assert_eq!(size.to_emu(), EmuSize::new(9_144_000, 5_143_500));
    }

    #[test]
    fn test_expand_and_contains() {
        let glyphs = Rect::new(72.0, 72.0, 200.0, 90.0);
        let region = glyphs.expand(2.0);
        assert_eq!(region, Rect::new(70.0, 70.0, 202.0, 92.0));
        assert!(region.contains(&glyphs, 0.0));
        assert!(!glyphs.contains(&region, 0.0));
        assert!(glyphs.contains(&region, 2.0));
    }

    #[test]
    fn test_degenerate() {
        assert!(Rect::new(10.0, 10.0, 10.0, 20.0).is_degenerate());
        assert!(Rect::new(10.0, 10.0, f32::NAN, 20.0).is_degenerate());
        assert!(!Rect::new(10.0, 10.0, 11.0, 20.0).is_degenerate());
    }

    #[test]
    fn test_intersection() {
        let page = LETTER.bounds();
        assert_eq!(
            Rect::new(560.0, 72.0, 614.0, 90.0).intersection(&page),
            Rect::new(560.0, 72.0, 612.0, 90.0)
        );
        assert!(Rect::new(700.0, 72.0, 720.0, 90.0).intersection(&page).is_degenerate());
    }

    #[test]
    fn test_pixels_at() {
        assert_eq!(LETTER.pixels_at(72), (612, 792));
        assert_eq!(LETTER.pixels_at(150), (1275, 1650));
    }
}
