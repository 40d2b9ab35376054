//! Number, licence number, date-or-purpose, units and single-word recognition.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::patterns::{
    AGGREGATE, CONNECTIVES, DATE_LIKE, LICENCE_SLASH, LICENCE_SPACE, NUMERIC_TOKEN, YEAR,
};

const TOKEN_PUNCTUATION: &[char] = &['(', ')', '[', ']', ',', ';', ':', '"', '\''];

fn clean_token(token: &str) -> &str {
    token
        .trim_start_matches(TOKEN_PUNCTUATION)
        .trim_end_matches(|c: char| c == '.' || TOKEN_PUNCTUATION.contains(&c))
}

/// Parse a numeric token such as "4550", "1,234.5" or "215.".
pub fn parse_number(token: &str) -> Option<Decimal> {
    let token = clean_token(token);
    if !NUMERIC_TOKEN.is_match(token) {
        return None;
    }
    Decimal::from_str(&token.replace(',', "")).ok()
}

/// First numeric token of the text, as written.
pub fn find_number(text: &str) -> Option<String> {
    text.split_whitespace().find_map(|token| {
        parse_number(token).map(|_| clean_token(token).to_string())
    })
}

fn numeric_groups(candidate: &str, separator: char) -> usize {
    candidate
        .split(separator)
        .filter(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit()))
        .count()
}

/// Every licence number in the text, in reading order.
///
/// Accepts slash-delimited ("25/68/001/247") and space-delimited
/// ("25 68 001 247") shapes with at least two all-digit groups.
pub fn find_licence_numbers(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for segment in CONNECTIVES.split(text) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let slashed: Vec<String> = LICENCE_SLASH
            .find_iter(segment)
            .map(|m| m.as_str())
            .filter(|c| numeric_groups(c, '/') >= 2 && !DATE_LIKE.is_match(c))
            .map(str::to_string)
            .collect();

        let candidates = if slashed.is_empty() {
            LICENCE_SPACE
                .find_iter(segment)
                .map(|m| m.as_str())
                .filter(|c| numeric_groups(c, ' ') >= 2)
                .map(str::to_string)
                .collect()
        } else {
            slashed
        };

        for candidate in candidates {
            if !found.contains(&candidate) {
                found.push(candidate);
            }
        }
    }

    found
}

/// Whether the text holds at least one licence number.
pub fn is_licence_number(text: &str) -> bool {
    !find_licence_numbers(text).is_empty()
}

/// Whether the text reads as a dated period or an aggregate purpose.
pub fn is_date_or_purpose(text: &str) -> bool {
    YEAR.is_match(text) || AGGREGATE.is_match(text)
}

/// Canonical possibility found earliest in the text; ties go to the longest.
pub fn match_units(text: &str, possibilities: &[String]) -> Option<String> {
    let lower = text.to_lowercase();
    let bytes = lower.as_bytes();
    let bounded = |start: usize, end: usize| {
        (start == 0 || !bytes[start - 1].is_ascii_alphanumeric())
            && (end == bytes.len() || !bytes[end].is_ascii_alphanumeric())
    };

    possibilities
        .iter()
        .filter_map(|possibility| {
            let needle = possibility.to_lowercase();
            if needle.trim().is_empty() {
                return None;
            }
            lower
                .match_indices(needle.as_str())
                .find(|(start, _)| bounded(*start, start + needle.len()))
                .map(|(start, _)| (start, needle.len(), possibility))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, _, possibility)| possibility.clone())
}

/// First word, stripped of surrounding punctuation.
pub fn first_word(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|t| !t.is_empty())
        .map(str::to_string)
}
