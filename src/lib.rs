//! PDF to editable slide deck conversion.
//!
//! Each page becomes one slide: the page with its text erased is rasterized
//! as a full-bleed background, and every run of text is re-added on top as a
//! borderless text box at its original position.

pub mod config;
pub mod convert;

pub use config::{config_path, load_config, save_config, AppConfig, ConfigError};
pub use convert::{converter_for, HybridConverter, ImageOnlyConverter};
pub use pagedeck_core::{
    ConversionKind, ConversionReport, ConversionWarning, ConvertError, ConvertOptions, Quality, Stage,
};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Converts `input` into an editable deck at `output` (hybrid mode).
///
/// `progress` is called with `(pages_done, pages_total)` after every slide;
/// returning an error aborts the conversion. On failure the returned string
/// is ready to show to a user and nothing has been written to `output`.
pub fn convert<F>(input: &Path, output: &Path, progress: F, dpi: u32) -> Result<ConversionReport, String>
where
    F: FnMut(usize, usize) -> anyhow::Result<()>,
{
    convert_with(input, output, progress, &ConvertOptions::default().with_dpi(dpi))
}

/// Same as [`convert`], with the conversion kind and every tunable taken from `options`.
pub fn convert_with<F>(
    input: &Path,
    output: &Path,
    mut progress: F,
    options: &ConvertOptions,
) -> Result<ConversionReport, String>
where
    F: FnMut(usize, usize) -> anyhow::Result<()>,
{
    let kind = options.kind;
    log::info!(
        "[Convert] {} -> {} ({}, {} dpi)",
        input.display(),
        output.display(),
        kind.label(),
        options.dpi
    );

    guarded(kind, || converter_for(kind).convert(input, output, &mut progress, options))
}

/// Runs a conversion, turning errors and panics into user-facing messages.
fn guarded<T>(kind: ConversionKind, run: impl FnOnce() -> Result<T, ConvertError>) -> Result<T, String> {
    let message = match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(ConvertError::EmptyDocument)) => ConvertError::EmptyDocument.to_string(),
        Ok(Err(e)) => format!("{} conversion failed: {}", kind.label(), e),
        Err(payload) => format!("{} conversion failed: {}", kind.label(), panic_message(payload.as_ref())),
    };
    log::error!("[Convert] {}", message);
    Err(message)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object};

    fn no_progress(_: usize, _: usize) -> anyhow::Result<()> {
        Ok(())
    }

    fn empty_pdf(path: &Path) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_empty_document_rejected_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.pdf");
        let output = dir.path().join("empty.pptx");
        empty_pdf(&input);

        let err = convert(&input, &output, no_progress, 150).unwrap_err();
        assert_eq!(err, "The selected PDF is empty.");
        assert!(!output.exists());

        let options = ConvertOptions::default().with_kind(ConversionKind::ImageOnly);
        let err = convert_with(&input, &output, no_progress, &options).unwrap_err();
        assert_eq!(err, "The selected PDF is empty.");
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input_is_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pptx");
        let err = convert(&dir.path().join("missing.pdf"), &output, no_progress, 150).unwrap_err();
        assert!(err.starts_with("Hybrid conversion failed: "), "{}", err);
        assert!(!output.exists());
    }

    #[test]
    fn test_zero_dpi_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.pdf");
        empty_pdf(&input);
        let err = convert(&input, &dir.path().join("out.pptx"), no_progress, 0).unwrap_err();
        assert!(err.starts_with("Hybrid conversion failed: invalid options"), "{}", err);
    }

    #[test]
    fn test_panic_is_contained() {
        let err = guarded::<()>(ConversionKind::ImageOnly, || panic!("page tree loop")).unwrap_err();
        assert_eq!(err, "Image-only conversion failed: page tree loop");

        let err = guarded::<()>(ConversionKind::Hybrid, || panic!("{} pages", 3)).unwrap_err();
        assert_eq!(err, "Hybrid conversion failed: 3 pages");
    }

    #[test]
    fn test_errors_are_prefixed() {
        let err = guarded::<()>(ConversionKind::Hybrid, || Err(ConvertError::Pdfium("not found".into()))).unwrap_err();
        assert_eq!(err, "Hybrid conversion failed: PDFium unavailable: not found");
    }
}
