//! Company and personal-name recognition.

use super::lexicon::Lexicon;
use super::patterns::{bare_word, INITIALS_SURNAME, STREET_SUFFIXES, TITLE_PREFIXES, TRAILING_DIGIT};

/// Whether the text opens with a personal title such as "Mr" or "Messrs.".
pub fn starts_with_title(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(bare_word)
        .is_some_and(|w| TITLE_PREFIXES.contains(&w.as_str()))
}

/// Whether the last word is a street-type suffix.
pub fn ends_with_street_suffix(text: &str) -> bool {
    text.split_whitespace()
        .last()
        .map(bare_word)
        .is_some_and(|w| STREET_SUFFIXES.contains(&w.as_str()))
}

/// Recognise a company or personal name, truncated after the first organisation suffix.
pub fn recognise_name(text: &str, lexicon: &Lexicon) -> Option<String> {
    let trimmed = text
        .trim()
        .trim_matches(|c: char| matches!(c, ',' | ':' | ';' | '-'))
        .trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some((_, mut end)) = lexicon.organisation_suffix_span(trimmed) {
        // "Farms Ltd." and "& Sons Limited" are one suffix run
        while let Some((start, len)) = lexicon.organisation_suffix_span(&trimmed[end..]) {
            if !trimmed[end..end + start].trim().is_empty() {
                break;
            }
            end += len;
        }
        let name = trimmed[..end].trim_end_matches(',').trim();
        if ends_with_street_suffix(name) {
            return None;
        }
        return Some(name.to_string());
    }

    if ends_with_street_suffix(trimmed) || TRAILING_DIGIT.is_match(trimmed) {
        return None;
    }

    let first_name_token = trimmed
        .split_whitespace()
        .take(2)
        .any(|token| lexicon.is_first_name(&bare_word(token)));

    if INITIALS_SURNAME.is_match(trimmed) || starts_with_title(trimmed) || first_name_token {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Whether the text reads as a company or personal name.
pub fn is_name(text: &str, lexicon: &Lexicon) -> bool {
    recognise_name(text, lexicon).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncates_after_first_suffix_run() {
        let lexicon = Lexicon::new();
        assert_eq!(
            recognise_name("Acme Water Limited (hereinafter the Licence Holder)", &lexicon),
            Some("Acme Water Limited".to_string())
        );
        assert_eq!(
            recognise_name("Bravo Farms Ltd. of Upper Farm", &lexicon),
            Some("Bravo Farms Ltd.".to_string())
        );
    }

    #[test]
    fn test_personal_names() {
        let lexicon = Lexicon::new();
        assert!(is_name("Mr A Jones", &lexicon));
        assert!(is_name("J.R. Hartley", &lexicon));
        assert!(is_name("Margaret Hughes", &lexicon));
        assert!(is_name("Hughes, Margaret", &lexicon));
    }

    #[test]
    fn test_rejects_addresses_and_numbered_descriptions() {
        let lexicon = Lexicon::new();
        assert!(!is_name("John Street", &lexicon));
        assert!(!is_name("Mr Smith Plot 12", &lexicon));
        assert!(!is_name("abstraction from the river", &lexicon));
    }

    #[test]
    fn test_custom_first_names() {
        let lexicon = Lexicon::new().with_first_names(["Olwen"]);
        assert!(is_name("Olwen Price", &lexicon));
        assert!(!is_name("Margaret Hughes", &lexicon));
    }
}
