//! Error types for the paperforge library

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the paperforge library
#[derive(Error, Debug)]
pub enum Error {
    /// Input bytes are not a decodable PDF (bad header, broken xref,
    /// unresolvable page content, unsupported encryption). Never produces
    /// a partial document.
    #[error("failed to decode PDF: {0}")]
    Decode(String),

    /// The document state could not be serialized. Always a defect.
    #[error("failed to encode PDF: {0}")]
    Encode(String),

    /// Out-of-range page reference
    #[error("page index {index} out of range (document has {page_count} pages)")]
    PageIndex { index: usize, page_count: usize },

    /// Caller-supplied arguments violate an operation precondition
    #[error("{0}")]
    Validation(String),

    /// Codec-level error while manipulating an already-decoded document
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
}
