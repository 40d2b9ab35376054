//! Text sources feeding the matcher: direct line extraction, OCR and licence lookup.

pub mod lookup;
#[cfg(feature = "native")]
pub mod ocr;
pub mod pdf;
pub mod text;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{OcrError, Result};
use crate::models::document::DocumentLine;

pub use lookup::JsonLicenceLookup;
#[cfg(feature = "native")]
pub use ocr::LocalOcrProvider;
pub use pdf::PdfLineSource;
pub use text::TextLineSource;

/// An embedded image that may carry text, encoded as PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRegion {
    /// Page the image was found on (1-indexed).
    pub page_number: u32,
    /// Position of the image on its page.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    /// PNG bytes.
    pub data: Vec<u8>,
}

impl ImageRegion {
    /// Decode the stored PNG bytes.
    pub fn decode(&self) -> std::result::Result<DynamicImage, OcrError> {
        image::load_from_memory(&self.data).map_err(|e| OcrError::UndecodableRegion(e.to_string()))
    }

    /// Stable key for caching provider output.
    pub fn cache_key(&self) -> String {
        format!("p{}-i{}-{}x{}", self.page_number, self.index, self.width, self.height)
    }
}

/// What a line source read from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceDocument {
    /// Directly extracted lines, globally renumbered.
    pub lines: Vec<DocumentLine>,
    pub number_of_pages: u32,
    /// Images worth sending to OCR.
    pub image_regions: Vec<ImageRegion>,
}

impl SourceDocument {
    /// Total characters of direct text.
    pub fn text_len(&self) -> usize {
        self.lines.iter().map(|l| l.text.len()).sum()
    }
}

/// Reads directly extractable text from a document.
pub trait LineSource: Send + Sync {
    /// Whether this source can read the file.
    fn supports(&self, path: &Path) -> bool;

    /// Read ordered, page-numbered lines and enumerate image regions.
    fn read(&self, path: &Path) -> Result<SourceDocument>;
}

/// Relative cost of an OCR provider; cheaper providers are tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OcrCost {
    /// Runs in-process.
    Local,
    /// Calls an external service.
    Remote,
}

/// Turns an image region into lines with word confidences (0 - 100).
pub trait OcrProvider: Send + Sync {
    /// Service name recorded on results and in `services_used`.
    fn name(&self) -> &str;

    fn cost(&self) -> OcrCost;

    fn recognise(&self, region: &ImageRegion) -> std::result::Result<Vec<DocumentLine>, OcrError>;
}

/// Maps licence numbers to the documents holding them.
pub trait LicenceLookup: Send + Sync {
    fn path_for(&self, licence_number: &str) -> Option<PathBuf>;
}

/// Whether the path has one of the given extensions, case-insensitively.
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| extensions.contains(&e.as_str()))
}
