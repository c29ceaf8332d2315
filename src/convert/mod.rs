//! Conversion strategies and the pieces they share.

mod hybrid;
mod image_only;
pub mod rebuild;

pub use hybrid::HybridConverter;
pub use image_only::ImageOnlyConverter;

use std::fs;
use std::path::Path;

use pagedeck_core::{ConversionKind, ConvertError, Converter};
use pagedeck_pptx::{deck_to_bytes, Deck};

/// Resolves a conversion kind to its implementation.
pub fn converter_for(kind: ConversionKind) -> Box<dyn Converter> {
    match kind {
        ConversionKind::Hybrid => Box::new(HybridConverter),
        ConversionKind::ImageOnly => Box::new(ImageOnlyConverter),
    }
}

fn deck_title(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Serializes the finished deck and only then touches the output path.
fn write_output(deck: &Deck, output: &Path) -> Result<(), ConvertError> {
    let bytes = deck_to_bytes(deck).map_err(|e| ConvertError::Package(e.to_string()))?;
    fs::write(output, &bytes)?;
    log::info!("[Deck] saved {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}
