//! Document-level conversion errors.

use thiserror::Error;

/// Failures that abort a whole conversion.
///
/// Page- and span-level problems never show up here; they are recovered and
/// recorded as [`crate::ConversionWarning`]s instead.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("The selected PDF is empty.")]
    EmptyDocument,

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("cannot open document: {0}")]
    Open(String),

    #[error("PDFium unavailable: {0}")]
    Pdfium(String),

    #[error("cannot build working copy: {0}")]
    WorkingCopy(String),

    #[error("cannot write slide deck: {0}")]
    Package(String),

    #[error("progress callback failed: {0}")]
    Progress(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
