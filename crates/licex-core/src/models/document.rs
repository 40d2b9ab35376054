//! Normalised line and word records produced by line sources.

use serde::{Deserialize, Serialize};

/// A single word of a line, as reported by the text source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLineWord {
    /// Word text.
    pub text: String,

    /// OCR confidence (0 - 100), absent for directly extracted text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,

    /// Bounding box (left, top, right, bottom) when the source knows it.
    pub coordinates: [Option<f32>; 4],
}

impl DocumentLineWord {
    /// Create a word with no confidence or coordinates.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ocr_confidence: None,
            coordinates: [None; 4],
        }
    }

    /// Attach an OCR confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.ocr_confidence = Some(confidence);
        self
    }

    /// Attach a bounding box.
    pub fn with_coordinates(mut self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.coordinates = [Some(left), Some(top), Some(right), Some(bottom)];
        self
    }
}

/// A normalised line of document text.
///
/// Lines are never edited in place; every transformation builds a new line
/// at the same position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLine {
    /// Line text.
    pub text: String,

    /// Global line number within the document (0-indexed).
    pub line_number: usize,

    /// Page number (1-indexed).
    pub page_number: u32,

    /// Words making up the line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<DocumentLineWord>,
}

impl DocumentLine {
    /// Create a line whose words are derived from whitespace splitting.
    pub fn new(text: impl Into<String>, line_number: usize, page_number: u32) -> Self {
        let text = text.into();
        let words = text.split_whitespace().map(DocumentLineWord::new).collect();
        Self {
            text,
            line_number,
            page_number,
            words,
        }
    }

    /// Create a line from recognised words.
    pub fn from_words(words: Vec<DocumentLineWord>, line_number: usize, page_number: u32) -> Self {
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            line_number,
            page_number,
            words,
        }
    }

    /// Mean word confidence, if any word carries one.
    pub fn ocr_confidence(&self) -> Option<f32> {
        let scores: Vec<f32> = self.words.iter().filter_map(|w| w.ocr_confidence).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f32>() / scores.len() as f32)
        }
    }

    /// A new line at the same position with replaced text.
    ///
    /// Words whose text survives in the new line keep their metadata.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut remaining: Vec<&DocumentLineWord> = self.words.iter().collect();
        let words = text
            .split_whitespace()
            .map(|token| {
                match remaining.iter().position(|w| w.text == token) {
                    Some(idx) => remaining.remove(idx).clone(),
                    None => DocumentLineWord::new(token),
                }
            })
            .collect();
        Self {
            text,
            line_number: self.line_number,
            page_number: self.page_number,
            words,
        }
    }

    /// A standardised copy: whitespace collapsed, typographic punctuation mapped to ASCII.
    pub fn standardised(&self) -> Self {
        self.with_text(standardise_text(&self.text))
    }

    /// Whether the line holds no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Standardise raw text the way every line source does before matching.
pub fn standardise_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201b}' | '`' => '\'',
            '\u{201c}' | '\u{201d}' | '\u{201f}' => '"',
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            '\u{00a0}' | '\t' => ' ',
            _ => c,
        })
        .filter(|c| !c.is_control())
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assign global, gap-free line numbers in stream order.
pub fn renumber(lines: Vec<DocumentLine>) -> Vec<DocumentLine> {
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, mut line)| {
            line.line_number = idx;
            line
        })
        .collect()
}

/// Build numbered lines from plain text rows on a single page.
pub fn lines_from_text<'a>(rows: impl IntoIterator<Item = &'a str>, page_number: u32) -> Vec<DocumentLine> {
    rows.into_iter()
        .map(standardise_text)
        .filter(|row| !row.is_empty())
        .enumerate()
        .map(|(idx, row)| DocumentLine::new(row, idx, page_number))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ocr_confidence_is_mean_of_scored_words() {
        let line = DocumentLine::from_words(
            vec![
                DocumentLineWord::new("Licence").with_confidence(90.0),
                DocumentLineWord::new("holder").with_confidence(70.0),
                DocumentLineWord::new(":"),
            ],
            0,
            1,
        );
        assert_eq!(line.ocr_confidence(), Some(80.0));
        assert_eq!(line.text, "Licence holder :");
    }

    #[test]
    fn test_ocr_confidence_absent_for_direct_text() {
        let line = DocumentLine::new("Licence holder", 3, 1);
        assert_eq!(line.ocr_confidence(), None);
    }

    #[test]
    fn test_with_text_keeps_position_and_word_metadata() {
        let line = DocumentLine::from_words(
            vec![
                DocumentLineWord::new("Name:").with_confidence(50.0),
                DocumentLineWord::new("Acme").with_confidence(99.0),
            ],
            7,
            2,
        );
        let trimmed = line.with_text("Acme");
        assert_eq!(trimmed.line_number, 7);
        assert_eq!(trimmed.page_number, 2);
        assert_eq!(trimmed.ocr_confidence(), Some(99.0));
        assert_eq!(line.text, "Name: Acme");
    }

    #[test]
    fn test_standardise_text() {
        assert_eq!(
            standardise_text("  Holder\u{2019}s   name \u{2013}\tAcme  "),
            "Holder's name - Acme"
        );
    }

    #[test]
    fn test_lines_from_text_skips_blank_rows() {
        let lines = lines_from_text(["first", "   ", "second"], 1);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].line_number, 1);
        assert_eq!(lines[1].text, "second");
    }
}
