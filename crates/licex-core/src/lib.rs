//! Core library for licence document extraction.
//!
//! This crate provides:
//! - A declarative label specification (what to look for and where)
//! - Positional matching strategies with recursive sub-label resolution
//! - Text heuristics for noisy OCR output (corruption, autocorrection, names, numbers)
//! - PDF and plain-text line sources, and a local OCR fallback
//! - Whole-document extraction with linked-licence following and a leased extractor pool

pub mod error;
pub mod extractor;
pub mod matching;
pub mod models;
pub mod pool;
pub mod sources;
pub mod text;

pub use error::{LabelError, LicexError, OcrError, PdfError, Result};
pub use extractor::{DocumentExtractor, LinkTrail};
pub use matching::{LinkOutcome, LinkResolver, MatchState, Matcher, NoLinks};
pub use models::config::LicexConfig;
pub use models::defaults::default_label_spec;
pub use models::document::{DocumentLine, DocumentLineWord};
pub use models::label::{Format, LabelGroup, LabelSpec, LabelToMatch, Multiple, Position, RemoveRule};
pub use models::result::{DocumentResult, ExtractionWarning, LabelGroupResult, MatchType};
pub use pool::{ExtractorPool, Lease};
pub use sources::{ImageRegion, LicenceLookup, LineSource, OcrCost, OcrProvider, SourceDocument};
pub use text::lexicon::Lexicon;
