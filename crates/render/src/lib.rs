//! Page rasterization through pdfium.

use anyhow::{anyhow, Result};
use image::{DynamicImage, ImageFormat, RgbImage};
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use pagedeck_core::document::{PageImage, PageRasterizer};
use pagedeck_core::geometry::PageSize;
use pagedeck_core::options::DEFAULT_DPI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub dpi: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl RenderOptions {
    /// Pixel size of a page at this resolution.
    pub fn target_size(&self, page: PageSize) -> (u32, u32) {
        page.pixels_at(self.dpi)
    }
}

/// Encodes an RGB buffer as PNG.
pub fn encode_png(image: RgbImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| anyhow!("PNG encoding failed: {}", e))?;
    Ok(png)
}

/// Rasterizer over a document opened in pdfium.
pub struct PdfiumRasterizer<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumRasterizer<'a> {
    pub fn new(document: PdfDocument<'a>) -> Self {
        Self { document }
    }

    /// Opens an in-memory document, such as a redacted working copy.
    pub fn from_bytes(pdfium: &'a Pdfium, bytes: Vec<u8>) -> Result<Self> {
        let document = pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|e| anyhow!("cannot open document: {}", e))?;
        Ok(Self::new(document))
    }

    fn page(&self, index: usize) -> Result<PdfPage<'_>> {
        let page_number = u16::try_from(index).map_err(|_| anyhow!("page {} is out of range", index))?;
        self.document
            .pages()
            .get(page_number)
            .map_err(|e| anyhow!("cannot open page {}: {}", index + 1, e))
    }
}

impl PageRasterizer for PdfiumRasterizer<'_> {
    fn page_count(&self) -> usize {
        usize::from(self.document.pages().len())
    }

    fn page_size(&self, index: usize) -> Result<PageSize> {
        let page = self.page(index)?;
        Ok(PageSize::new(page.width().value, page.height().value))
    }

    fn rasterize(&self, index: usize, dpi: u32) -> Result<PageImage> {
        let page = self.page(index)?;
        let size = PageSize::new(page.width().value, page.height().value);
        let (width, height) = RenderOptions { dpi }.target_size(size);

        log::debug!(
            "[Render] page {}: {}x{} pt -> {}x{} px (DPI: {})",
            index + 1,
            size.width,
            size.height,
            width,
            height,
            dpi
        );

        let target_width = i32::try_from(width).map_err(|_| anyhow!("render width {} is too large", width))?;
        let target_height = i32::try_from(height).map_err(|_| anyhow!("render height {} is too large", height))?;
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_target_height(target_height);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| anyhow!("rendering failed: {}", e))?;
        let rgb = bitmap.as_image().to_rgb8();
        let (width, height) = rgb.dimensions();

        Ok(PageImage {
            page: index,
            width,
            height,
            png: encode_png(rgb)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_target_size() {
        let letter = PageSize::new(612.0, 792.0);
        assert_eq!(RenderOptions { dpi: 72 }.target_size(letter), (612, 792));
        assert_eq!(RenderOptions { dpi: 150 }.target_size(letter), (1275, 1650));
        assert_eq!(RenderOptions::default().dpi, 150);
    }

    #[test]
    fn test_encode_png() {
        let image = RgbImage::from_pixel(4, 3, Rgb([255, 255, 255]));
        let png = encode_png(image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }
}
