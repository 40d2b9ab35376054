//! Anchor discovery and the per-line view handed to strategies.

use std::sync::Arc;

use crate::models::document::DocumentLine;
use crate::models::label::{LabelToMatch, END_OF_BLOCK, START_OF_BLOCK};
use crate::models::result::{LabelGroupResult, MatchType, MatchedLabel, ResultSeed};
use crate::text::lexicon::Lexicon;

const SEPARATORS: &[char] = &[':', '-', ',', ';', '.', ' '];

/// Anchor phrase located on a line, as a byte span of the line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub phrase: String,
    pub start: usize,
    pub end: usize,
}

impl Anchor {
    pub fn is_block_start(&self) -> bool {
        self.phrase == START_OF_BLOCK
    }
}

/// Case-insensitive phrase search bounded at word edges.
pub fn find_phrase(text: &str, phrase: &str) -> Option<(usize, usize)> {
    let phrase = phrase.trim();
    if phrase.is_empty() || phrase.len() > text.len() {
        return None;
    }
    let haystack = text.to_ascii_lowercase();
    let needle = phrase.to_ascii_lowercase();
    let bytes = haystack.as_bytes();
    let starts_alnum = needle.as_bytes()[0].is_ascii_alphanumeric();
    let ends_alnum = needle.as_bytes()[needle.len() - 1].is_ascii_alphanumeric();

    haystack
        .match_indices(needle.as_str())
        .map(|(start, _)| (start, start + needle.len()))
        .find(|&(start, end)| {
            let left = !starts_alnum || start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
            let right = !ends_alnum || end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
            left && right
        })
}

/// First start anchor of the label found on `lines[index]`, in anchor
/// priority order.
///
/// `[START_OF_BLOCK]` matches only the first non-blank line of the stream.
pub fn find_anchor(label: &LabelToMatch, lines: &[DocumentLine], index: usize) -> Option<Anchor> {
    let line = lines.get(index)?;
    label.text_start.iter().find_map(|phrase| {
        if phrase == START_OF_BLOCK {
            let opens_block = !line.is_blank() && lines[..index].iter().all(DocumentLine::is_blank);
            return opens_block.then(|| Anchor {
                phrase: phrase.clone(),
                start: 0,
                end: 0,
            });
        }
        find_phrase(&line.text, phrase).map(|(start, end)| Anchor {
            phrase: phrase.clone(),
            start,
            end,
        })
    })
}

/// First end anchor of the label found in the text, in anchor priority order.
pub fn find_end(label: &LabelToMatch, text: &str) -> Option<(String, usize)> {
    label
        .text_end
        .iter()
        .filter(|phrase| phrase.as_str() != END_OF_BLOCK)
        .find_map(|phrase| find_phrase(text, phrase).map(|(start, _)| (phrase.clone(), start)))
}

/// Strip separators left between an anchor and its payload.
pub fn trim_separators(text: &str) -> &str {
    text.trim_matches(SEPARATORS).trim()
}

/// Everything a strategy sees for one anchored line.
pub struct LineContext<'a> {
    pub lines: &'a [DocumentLine],
    pub index: usize,
    pub anchor: Anchor,
    pub siblings: &'a [LabelGroupResult],
    pub lexicon: &'a Lexicon,
    pub seed: &'a ResultSeed,
}

impl<'a> LineContext<'a> {
    pub fn line(&self) -> &'a DocumentLine {
        &self.lines[self.index]
    }

    /// Payload text before the anchor.
    pub fn before(&self) -> &'a str {
        trim_separators(&self.line().text[..self.anchor.start])
    }

    /// Payload text after the anchor.
    pub fn after(&self) -> &'a str {
        trim_separators(&self.line().text[self.anchor.end..])
    }

    /// Text from the anchor to the end of the line, anchor included.
    pub fn from_anchor(&self) -> &'a str {
        self.line().text[self.anchor.start..].trim()
    }

    /// Text from the line start through the anchor.
    pub fn through_anchor(&self) -> &'a str {
        self.line().text[..self.anchor.end].trim()
    }

    /// Up to `n` lines before the anchored line, in reading order.
    pub fn previous(&self, n: usize) -> &'a [DocumentLine] {
        &self.lines[self.index.saturating_sub(n)..self.index]
    }

    /// Up to `n` lines after the anchored line.
    pub fn next(&self, n: usize) -> &'a [DocumentLine] {
        let start = (self.index + 1).min(self.lines.len());
        let end = (start + n).min(self.lines.len());
        &self.lines[start..end]
    }

    /// Every line after the anchored line.
    pub fn rest(&self) -> &'a [DocumentLine] {
        let start = (self.index + 1).min(self.lines.len());
        &self.lines[start..]
    }

    pub fn matched_label(&self, label: &Arc<LabelToMatch>) -> MatchedLabel {
        MatchedLabel::new(label).with_start(self.anchor.phrase.clone())
    }

    pub fn build(
        &self,
        label: &Arc<LabelToMatch>,
        match_type: MatchType,
        text: Vec<DocumentLine>,
    ) -> LabelGroupResult {
        self.seed.build(self.matched_label(label), match_type, text)
    }
}
