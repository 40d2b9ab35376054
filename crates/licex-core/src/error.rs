//! Error types for the licex-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a licence document from being extracted.
#[derive(Error, Debug)]
pub enum LicexError {
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// The label specification is unusable; the run stops before any document.
    #[error("invalid label specification: {0}")]
    Label(#[from] LabelError),

    /// Label specification, configuration or licence table is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither the PDF nor the plain-text source accepts the file.
    #[error("no line source reads {}", .0.display())]
    UnsupportedDocument(PathBuf),

    /// An extractor pool was requested with no extractors in it.
    #[error("extractor pool is empty")]
    EmptyPool,
}

/// Why a licence PDF yielded no lines.
#[derive(Error, Debug)]
pub enum PdfError {
    /// lopdf could not read the file.
    #[error("malformed licence PDF: {0}")]
    Malformed(String),

    /// Encrypted with a password other than the empty one.
    #[error("licence PDF is password protected")]
    PasswordProtected,

    #[error("licence PDF has no pages")]
    NoPages,
}

/// Failures of an OCR provider on a scanned region.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Detection, recognition or dictionary files missing or unreadable.
    #[error("OCR models unavailable: {0}")]
    ModelsUnavailable(String),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    /// The region bytes are not a decodable image.
    #[error("scanned region is not an image: {0}")]
    UndecodableRegion(String),
}

/// Configuration errors in a label specification.
///
/// These are programmer errors in the label specification, never data errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// A `Split` label has nothing to split on.
    #[error("label '{0}' uses Split position but has no anchor text")]
    SplitWithoutText(String),

    /// A `LinkedLicence` label does not name the sibling holding licence numbers.
    #[error("label '{0}' is a linked licence label without related_name")]
    LinkedWithoutRelatedName(String),

    /// A `RelatedCategoryPosition` label cannot be resolved.
    #[error("label '{0}' uses RelatedCategoryPosition without related_name")]
    CategoryWithoutRelatedName(String),

    /// A `Units` label has no closed value set.
    #[error("label '{0}' has Units format but no possibilities")]
    UnitsWithoutPossibilities(String),

    /// A label other than `LinkedLicence` or `RelatedCategoryPosition` has no anchor.
    #[error("label '{0}' has no anchor text")]
    MissingAnchor(String),

    /// An exclusion rule regex does not compile.
    #[error("label '{label}' has invalid exclusion pattern '{pattern}': {reason}")]
    InvalidPattern {
        label: String,
        pattern: String,
        reason: String,
    },
}

/// Result type for the licex library.
pub type Result<T> = std::result::Result<T, LicexError>;
