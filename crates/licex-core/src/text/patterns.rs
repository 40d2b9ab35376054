//! Shared regex patterns and fixed heuristic tables.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Short OCR noise such as "l1I" or "a4b"
    pub static ref LETTER_DIGIT_LETTER: Regex = Regex::new(
        r"^[A-Za-z]+\d+[A-Za-z]+$"
    ).unwrap();

    // "J. Smith", "J.R. Smith", "J R Smith"
    pub static ref INITIALS_SURNAME: Regex = Regex::new(
        r"^(?:[A-Z]\.\s*|[A-Z]\s+){1,3}[A-Z][a-z][A-Za-z'\-]*\b"
    ).unwrap();

    // Trailing digit description: "Plot 12", "No. 3a"
    pub static ref TRAILING_DIGIT: Regex = Regex::new(
        r"\d+[A-Za-z]?\.?$"
    ).unwrap();

    pub static ref NUMERIC_TOKEN: Regex = Regex::new(
        r"^[+-]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$"
    ).unwrap();

    pub static ref NUMBERISH_TOKEN: Regex = Regex::new(
        r"^[\d.,:\-]*\d[\d.,:\-]*$"
    ).unwrap();

    // Licence numbers: "25/68/001/247", "MD/028/0005/001"
    pub static ref LICENCE_SLASH: Regex = Regex::new(
        r"\b[A-Za-z0-9]{1,8}(?:/[A-Za-z0-9]{1,8}){1,7}\b"
    ).unwrap();

    // Licence numbers: "25 68 001 247"
    pub static ref LICENCE_SPACE: Regex = Regex::new(
        r"\b\d{1,4}(?: [A-Z0-9]{1,4}){1,6}\b"
    ).unwrap();

    pub static ref DATE_LIKE: Regex = Regex::new(
        r"^\d{1,2}/\d{1,2}/\d{2,4}$"
    ).unwrap();

    // Connective words and punctuation separating several licence numbers
    pub static ref CONNECTIVES: Regex = Regex::new(
        r"(?i)\s+(?:and|or|to|&)\s+|[,;()]"
    ).unwrap();

    pub static ref YEAR: Regex = Regex::new(
        r"\b(?:19|20)\d{2}\b"
    ).unwrap();

    pub static ref AGGREGATE: Regex = Regex::new(
        r"(?i)\baggregate\b"
    ).unwrap();
}

/// Personal title prefixes, lowercase without trailing dots.
pub const TITLE_PREFIXES: &[&str] = &[
    "mr", "mrs", "ms", "miss", "messrs", "dr", "sir", "dame", "lord", "lady", "rev",
    "reverend", "major", "captain", "capt", "col", "colonel", "prof",
];

/// Short words that are legitimate in running text.
pub const FUNCTION_WORDS: &[&str] = &[
    "a", "i", "an", "am", "as", "at", "be", "by", "do", "he", "if", "in", "is", "it", "me",
    "my", "no", "of", "on", "or", "so", "to", "up", "us", "we", "mr", "ms", "dr", "st", "co",
    "uk", "ie", "eg", "nr", "m3", "ha",
];

/// Organisational suffixes marking a company or body name.
pub const ORGANISATION_SUFFIXES: &[&str] = &[
    "limited", "ltd", "plc", "llp", "lp", "& co", "and co", "& sons", "and sons",
    "company", "corporation", "council", "trust", "trustees", "partnership", "farms",
    "estate", "estates", "authority", "board", "society", "association", "holdings",
    "group", "inc",
];

/// Street-type suffixes; a line ending in one is an address, not a name.
pub const STREET_SUFFIXES: &[&str] = &[
    "road", "rd", "street", "st", "lane", "ln", "avenue", "ave", "drive", "dr", "close",
    "way", "crescent", "place", "court", "terrace", "gardens", "hill", "square",
];

/// Symbols tolerated in lines that start lowercase.
pub const ALLOWED_SYMBOLS: &[char] = &[
    ',', '.', '-', '/', '\'', '&', '(', ')', '%', ':', ';', '"',
];

/// Spelling suggestions preferred when several are offered.
pub const PREFERRED_SUGGESTIONS: &[&str] = &[
    "licence", "licensed", "abstraction", "abstract", "aggregate", "borehole", "cubic",
    "metres", "litres", "megalitres", "gallons", "holder", "irrigation", "spray", "quantity",
    "maximum", "point", "purpose", "period", "reservoir", "groundwater", "surface", "water",
    "hour", "day", "year", "annual",
];

/// First names shipped for the default lexicon.
pub const DEFAULT_FIRST_NAMES: &[&str] = &[
    "john", "james", "william", "robert", "richard", "david", "peter", "michael", "thomas",
    "george", "charles", "edward", "henry", "arthur", "frederick", "albert", "andrew",
    "anthony", "christopher", "stephen", "paul", "mark", "ian", "alan", "brian", "colin",
    "keith", "simon", "philip", "roger", "mary", "elizabeth", "margaret", "sarah", "jane",
    "ann", "anne", "susan", "patricia", "helen", "joan", "dorothy", "barbara", "catherine",
    "emma", "ruth", "alice", "kathleen",
];

/// Lowercase a token and strip surrounding punctuation.
pub fn bare_word(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '&')
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initials_surname() {
        assert!(INITIALS_SURNAME.is_match("J. Smith"));
        assert!(INITIALS_SURNAME.is_match("J.R. Smith and Sons"));
        assert!(INITIALS_SURNAME.is_match("J R Smith"));
        assert!(!INITIALS_SURNAME.is_match("Acme Water"));
    }

    #[test]
    fn test_numeric_token() {
        assert!(NUMERIC_TOKEN.is_match("4550"));
        assert!(NUMERIC_TOKEN.is_match("1,234.5"));
        assert!(!NUMERIC_TOKEN.is_match("25/68"));
        assert!(!NUMERIC_TOKEN.is_match("12,34"));
    }

    #[test]
    fn test_bare_word() {
        assert_eq!(bare_word("(Limited),"), "limited");
        assert_eq!(bare_word("Mr."), "mr");
    }
}
