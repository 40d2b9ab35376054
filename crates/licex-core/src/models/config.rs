//! Run configuration: which labels to match, where linked licences live,
//! how PDFs are read and when OCR takes over.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Everything a run reads from `config.json`; missing sections take defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LicexConfig {
    pub extraction: ExtractionConfig,
    pub pdf: PdfConfig,
    pub ocr: OcrConfig,
    pub lexicon: LexiconConfig,
}

/// Label specification, linked-licence following and pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Label specification file; the built-in specification when unset.
    pub labels: Option<PathBuf>,

    /// Licence number to document path table (JSON object).
    pub licence_lookup: Option<PathBuf>,

    /// Maximum depth of linked-licence recursion.
    pub max_link_depth: usize,

    /// Run OCR autocorrection on OCR lines before matching.
    pub auto_correct: bool,

    /// Number of extractor instances in the batch pool.
    pub pool_size: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            labels: None,
            licence_lookup: None,
            max_link_depth: 3,
            auto_correct: true,
            pool_size: 4,
        }
    }
}

/// How licence PDFs are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Read only the first pages of long licences (0 reads all).
    pub max_pages: usize,

    /// Below this many characters of embedded text the licence counts as a
    /// scan, and pdf-extract is tried before OCR.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            min_text_length: 50,
        }
    }
}

/// When and how scanned regions are recognised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Fall back to OCR when groups stay unmatched.
    pub enabled: bool,

    /// Directory containing the local OCR models.
    pub model_dir: PathBuf,

    /// Drop recognised words below this confidence (0 - 100).
    pub min_word_confidence: f32,

    /// Keep `[UNK]` tokens emitted by the recogniser.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: PathBuf::from("models"),
            min_word_confidence: 0.0,
            keep_unk: false,
        }
    }
}

/// Reference data files for the text heuristics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Newline-separated dictionary words.
    pub dictionary: Option<PathBuf>,

    /// Newline-separated first names.
    pub first_names: Option<PathBuf>,
}

impl LicexConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write pretty-printed JSON, the format `config init` produces.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
