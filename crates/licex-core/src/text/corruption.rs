//! Corrupted-text detection for OCR noise.

use tracing::trace;

use super::lexicon::Lexicon;
use super::names::{is_name, starts_with_title};
use super::patterns::{
    bare_word, ALLOWED_SYMBOLS, FUNCTION_WORDS, LETTER_DIGIT_LETTER, NUMBERISH_TOKEN,
};

const SHORT_SHAPE_MAX_CHARS: usize = 6;
const SHORT_WORD_MIN_COUNT: usize = 3;
const SHORT_WORD_MIN_SHARE: f32 = 0.2;
const UNKNOWN_WORD_MIN_CHECKED: usize = 3;
const UNKNOWN_WORD_MIN_SHARE: f32 = 0.5;

/// Whether a line should be rejected as OCR noise.
///
/// Names and lines ending in an organisation suffix are never noise.
pub fn is_corrupted(text: &str, lexicon: &Lexicon) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }
    if starts_with_title(trimmed)
        || lexicon.ends_with_organisation_suffix(trimmed)
        || is_name(trimmed, lexicon)
    {
        return false;
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.chars().count() <= SHORT_SHAPE_MAX_CHARS && LETTER_DIGIT_LETTER.is_match(&compact) {
        trace!("'{}' rejected: letter-digit-letter shape", trimmed);
        return true;
    }

    let starts_lowercase = trimmed.chars().next().is_some_and(char::is_lowercase);
    let has_stray_symbol = trimmed
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace() && !ALLOWED_SYMBOLS.contains(&c));
    if starts_lowercase && has_stray_symbol {
        trace!("'{}' rejected: lowercase start with stray symbols", trimmed);
        return true;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let mut short_words = 0usize;
    let mut checked = 0usize;
    let mut unknown = 0usize;

    for token in &tokens {
        if NUMBERISH_TOKEN.is_match(token) || token.contains('/') {
            continue;
        }
        let word = bare_word(token);
        if word.is_empty() || !word.chars().all(char::is_alphabetic) {
            continue;
        }
        if word.chars().count() <= 2 {
            if !FUNCTION_WORDS.contains(&word.as_str()) {
                short_words += 1;
            }
            continue;
        }
        if let Some(known) = lexicon.is_known(&word) {
            checked += 1;
            if !known {
                unknown += 1;
            }
        }
    }

    if short_words >= SHORT_WORD_MIN_COUNT
        && short_words as f32 / tokens.len() as f32 >= SHORT_WORD_MIN_SHARE
    {
        trace!("'{}' rejected: {} stray short words", trimmed, short_words);
        return true;
    }

    if checked >= UNKNOWN_WORD_MIN_CHECKED
        && unknown as f32 / checked as f32 >= UNKNOWN_WORD_MIN_SHARE
    {
        trace!("'{}' rejected: {}/{} unknown words", trimmed, unknown, checked);
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::lexicon::WordList;

    #[test]
    fn test_short_word_noise_is_rejected() {
        let lexicon = Lexicon::new();
        assert!(is_corrupted("ab xq Lorem zz qv ipsum", &lexicon));
        assert!(is_corrupted("Lorem ab ipsum xq dolor zz sit amet consectetur elit", &lexicon));
    }

    #[test]
    fn test_short_word_noise_exemptions() {
        let lexicon = Lexicon::new();
        assert!(!is_corrupted("Mr ab xq zz Jones", &lexicon));
        assert!(!is_corrupted("ab xq zz Holdings Limited", &lexicon));
    }

    #[test]
    fn test_short_words_below_share_are_tolerated() {
        let lexicon = Lexicon::new();
        // 3 short words out of 16 tokens is under a fifth
        assert!(!is_corrupted(
            "ab Lorem xq ipsum zz dolor sit amet consectetur adipiscing elit sed tempor incididunt labore magna",
            &lexicon
        ));
    }

    #[test]
    fn test_function_words_and_numbers_are_not_noise() {
        let lexicon = Lexicon::new();
        assert!(!is_corrupted("Up to and including 31 March 2025", &lexicon));
        assert!(!is_corrupted("215 cubic metres per hour", &lexicon));
        assert!(!is_corrupted("Licence serial No. 25/68/001/247", &lexicon));
    }

    #[test]
    fn test_letter_digit_letter_shape() {
        let lexicon = Lexicon::new();
        assert!(is_corrupted("l1I", &lexicon));
        assert!(is_corrupted("a4 b", &lexicon));
        assert!(!is_corrupted("A4 paper sheets", &lexicon));
    }

    #[test]
    fn test_lowercase_with_symbols() {
        let lexicon = Lexicon::new();
        assert!(is_corrupted("ixe ~ ,;{ vne", &lexicon));
        assert!(!is_corrupted("and the river (east bank)", &lexicon));
    }

    #[test]
    fn test_unknown_words_with_dictionary() {
        let lexicon = Lexicon::new()
            .with_spell_checker(WordList::new(["abstraction", "point", "river", "from", "the"]));
        assert!(is_corrupted("Abstraetion pomt frorn tbe river", &lexicon));
        assert!(!is_corrupted("Abstraction point from the river", &lexicon));
    }

    #[test]
    fn test_blank_is_corrupted() {
        assert!(is_corrupted("   ", &Lexicon::new()));
    }
}
