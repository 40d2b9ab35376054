//! Injected reference data: spell checking, first names, organisation suffixes.

use std::collections::HashSet;
use std::path::Path;

use strsim::levenshtein;
use tracing::debug;

use super::patterns::{
    DEFAULT_FIRST_NAMES, FUNCTION_WORDS, ORGANISATION_SUFFIXES, PREFERRED_SUGGESTIONS,
};
use crate::models::config::LexiconConfig;

/// Word-validity and suggestion service.
pub trait SpellChecker: Send + Sync {
    /// Whether the (lowercase) word is spelled correctly.
    fn is_valid(&self, word: &str) -> bool;

    /// Ranked spelling suggestions, best first.
    fn suggestions(&self, word: &str) -> Vec<String>;
}

/// Dictionary backed by a plain word list.
///
/// Suggestions are the words within edit distance 2, closest first, ties in
/// list order.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: Vec<String>,
    index: HashSet<String>,
}

impl WordList {
    const MAX_DISTANCE: usize = 2;
    const MAX_SUGGESTIONS: usize = 5;

    pub fn new<S: AsRef<str>>(words: impl IntoIterator<Item = S>) -> Self {
        let mut list = Self::default();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() && list.index.insert(word.clone()) {
                list.words.push(word);
            }
        }
        list
    }

    /// Load a newline-separated word file.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let list = Self::new(content.lines());
        debug!("Loaded {} dictionary words from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl SpellChecker for WordList {
    fn is_valid(&self, word: &str) -> bool {
        self.index.contains(&word.to_lowercase())
    }

    fn suggestions(&self, word: &str) -> Vec<String> {
        let word = word.to_lowercase();
        let len = word.chars().count();
        if len < 2 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &String)> = self
            .words
            .iter()
            .filter(|w| w.chars().count().abs_diff(len) <= Self::MAX_DISTANCE)
            .map(|w| (levenshtein(&word, w), w))
            .filter(|(d, _)| *d > 0 && *d <= Self::MAX_DISTANCE)
            .collect();

        // stable: equal distances keep list order
        scored.sort_by_key(|(d, _)| *d);
        scored
            .into_iter()
            .take(Self::MAX_SUGGESTIONS)
            .map(|(_, w)| w.clone())
            .collect()
    }
}

/// Reference data shared by every heuristic, built once per run.
pub struct Lexicon {
    checker: Option<Box<dyn SpellChecker>>,
    first_names: HashSet<String>,
    organisation_suffixes: Vec<String>,
    preferred_suggestions: Vec<String>,
}

impl Lexicon {
    /// Lexicon with the built-in tables and no dictionary.
    ///
    /// Without a dictionary the unknown-word rule and autocorrection are inert.
    pub fn new() -> Self {
        Self {
            checker: None,
            first_names: DEFAULT_FIRST_NAMES.iter().map(|s| s.to_string()).collect(),
            organisation_suffixes: ORGANISATION_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            preferred_suggestions: PREFERRED_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Load dictionary and first names from configured files.
    pub fn from_config(config: &LexiconConfig) -> std::io::Result<Self> {
        let mut lexicon = Self::new();
        if let Some(path) = &config.dictionary {
            lexicon = lexicon.with_spell_checker(WordList::from_file(path)?);
        }
        if let Some(path) = &config.first_names {
            let names = std::fs::read_to_string(path)?;
            lexicon = lexicon.with_first_names(names.lines());
        }
        Ok(lexicon)
    }

    pub fn with_spell_checker(mut self, checker: impl SpellChecker + 'static) -> Self {
        self.checker = Some(Box::new(checker));
        self
    }

    pub fn with_first_names<S: AsRef<str>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.first_names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        self
    }

    pub fn with_organisation_suffixes<S: AsRef<str>>(mut self, suffixes: impl IntoIterator<Item = S>) -> Self {
        self.organisation_suffixes = suffixes
            .into_iter()
            .map(|s| s.as_ref().trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn with_preferred_suggestions<S: AsRef<str>>(mut self, words: impl IntoIterator<Item = S>) -> Self {
        self.preferred_suggestions = words.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
        self
    }

    pub fn has_dictionary(&self) -> bool {
        self.checker.is_some()
    }

    /// Dictionary verdict for a word; `None` without a dictionary.
    ///
    /// Function words always count as known.
    pub fn is_known(&self, word: &str) -> Option<bool> {
        let checker = self.checker.as_ref()?;
        let lower = word.to_lowercase();
        Some(FUNCTION_WORDS.contains(&lower.as_str()) || checker.is_valid(&lower))
    }

    pub fn suggestions(&self, word: &str) -> Vec<String> {
        self.checker
            .as_ref()
            .map(|c| c.suggestions(&word.to_lowercase()))
            .unwrap_or_default()
    }

    /// Best suggestion: a preferred word if offered, else the top-ranked one.
    pub fn best_suggestion(&self, word: &str) -> Option<String> {
        let suggestions = self.suggestions(word);
        suggestions
            .iter()
            .find(|s| self.preferred_suggestions.contains(s))
            .or_else(|| suggestions.first())
            .cloned()
    }

    pub fn is_first_name(&self, word: &str) -> bool {
        self.first_names.contains(&word.to_lowercase())
    }

    /// Byte span of the earliest organisation suffix, including a trailing dot.
    pub fn organisation_suffix_span(&self, text: &str) -> Option<(usize, usize)> {
        let lower = text.to_ascii_lowercase();
        let bytes = lower.as_bytes();
        let is_word_byte = |b: u8| b.is_ascii_alphanumeric();

        let mut best: Option<(usize, usize)> = None;
        for suffix in &self.organisation_suffixes {
            for (start, _) in lower.match_indices(suffix.as_str()) {
                let end = start + suffix.len();
                let bounded_left = start == 0 || !is_word_byte(bytes[start - 1]);
                let bounded_right = end == bytes.len() || !is_word_byte(bytes[end]);
                if !(bounded_left && bounded_right) {
                    continue;
                }
                let end = if bytes.get(end) == Some(&b'.') { end + 1 } else { end };
                let better = match best {
                    None => true,
                    Some((s, e)) => start < s || (start == s && end > e),
                };
                if better {
                    best = Some((start, end));
                }
                break;
            }
        }
        best
    }

    /// Whether the text ends with an organisation suffix.
    pub fn ends_with_organisation_suffix(&self, text: &str) -> bool {
        let trimmed = text.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '.').trim_end();
        let trimmed = trimmed.trim_end_matches('.');
        self.organisation_suffixes.iter().any(|suffix| {
            let lower = trimmed.to_ascii_lowercase();
            lower.ends_with(suffix.as_str())
                && lower[..lower.len() - suffix.len()]
                    .chars()
                    .last()
                    .is_none_or(|c| !c.is_ascii_alphanumeric())
        })
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexicon")
            .field("has_dictionary", &self.has_dictionary())
            .field("first_names", &self.first_names.len())
            .field("organisation_suffixes", &self.organisation_suffixes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_word_list_suggestions_ranked_by_distance() {
        let words = WordList::new(["licences", "licence", "abstraction"]);
        assert!(words.is_valid("Licence"));
        assert_eq!(
            words.suggestions("licenc"),
            vec!["licence".to_string(), "licences".to_string()]
        );
        assert_eq!(words.suggestions("abstractoin"), vec!["abstraction".to_string()]);
        assert!(words.suggestions("q").is_empty());
    }

    #[test]
    fn test_best_suggestion_prefers_curated_words() {
        let lexicon = Lexicon::new().with_spell_checker(WordList::new(["metros", "metres"]));
        assert_eq!(lexicon.suggestions("metras")[0], "metros");
        assert_eq!(lexicon.best_suggestion("metras"), Some("metres".to_string()));
    }

    #[test]
    fn test_is_known_without_dictionary() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.is_known("anything"), None);
    }

    #[test]
    fn test_organisation_suffix_span() {
        let lexicon = Lexicon::new();
        let text = "Acme Water Ltd. (the Licence Holder)";
        assert_eq!(lexicon.organisation_suffix_span(text), Some((11, 15)));
        assert_eq!(lexicon.organisation_suffix_span("Cotton Farming"), None);
        assert!(lexicon.ends_with_organisation_suffix("Bravo Farms Limited,"));
        assert!(!lexicon.ends_with_organisation_suffix("Grouping"));
    }
}
