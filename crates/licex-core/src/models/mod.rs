//! Data models for documents, label specifications and results.

pub mod config;
pub mod defaults;
pub mod document;
pub mod label;
pub mod result;

pub use config::{ExtractionConfig, LexiconConfig, LicexConfig, OcrConfig, PdfConfig};
pub use document::{DocumentLine, DocumentLineWord};
pub use label::{Format, LabelGroup, LabelSpec, LabelToMatch, Multiple, Position, RemoveRule};
pub use result::{DocumentResult, ExtractionWarning, LabelGroupResult, MatchType, MatchedLabel};
