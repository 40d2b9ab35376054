//! Dictionary-driven correction of OCR misreads.

use tracing::trace;

use super::lexicon::Lexicon;
use super::patterns::TITLE_PREFIXES;
use crate::models::document::DocumentLine;

/// A token split into surrounding punctuation and its word core.
struct Token<'a> {
    lead: &'a str,
    core: &'a str,
    trail: &'a str,
}

impl<'a> Token<'a> {
    fn parse(raw: &'a str) -> Self {
        let start = raw
            .find(|c: char| c.is_alphanumeric())
            .unwrap_or(raw.len());
        let end = raw
            .rfind(|c: char| c.is_alphanumeric())
            .map(|i| i + raw[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(start);
        Self {
            lead: &raw[..start],
            core: &raw[start..end.max(start)],
            trail: &raw[end.max(start)..],
        }
    }
}

fn is_protected(core: &str, lexicon: &Lexicon) -> bool {
    if core.is_empty() || core.chars().any(|c| !c.is_alphabetic()) {
        // digits, internal dots ("J.R") and hyphenated forms stay as read
        return true;
    }
    let lower = core.to_lowercase();
    let char_count = core.chars().count();
    let is_initial = char_count == 1 && core.chars().all(char::is_uppercase);
    let is_abbreviation = char_count > 1 && char_count <= 4 && core.chars().all(char::is_uppercase);

    is_initial
        || is_abbreviation
        || TITLE_PREFIXES.contains(&lower.as_str())
        || lexicon.is_first_name(&lower)
}

fn is_number_variant(word: &str, suggestion: &str) -> bool {
    let word = word.to_lowercase();
    let suggestion = suggestion.to_lowercase();
    [("s", ""), ("es", ""), ("", "s"), ("", "es")]
        .iter()
        .any(|(from_word, from_suggestion)| {
            let word_stem = word.strip_suffix(from_word);
            let suggestion_stem = suggestion.strip_suffix(from_suggestion);
            matches!((word_stem, suggestion_stem), (Some(a), Some(b)) if a == b && word != suggestion)
        })
}

fn match_case(original: &str, replacement: &str) -> String {
    let mut chars = original.chars();
    let first_upper = chars.next().is_some_and(char::is_uppercase);
    let all_upper = original.chars().count() > 1 && original.chars().all(char::is_uppercase);

    if all_upper {
        replacement.to_uppercase()
    } else if first_upper {
        let mut out = String::with_capacity(replacement.len());
        let mut rc = replacement.chars();
        if let Some(c) = rc.next() {
            out.extend(c.to_uppercase());
        }
        out.extend(rc);
        out
    } else {
        replacement.to_lowercase()
    }
}

/// Correct OCR misreads word by word.
///
/// Returns the text unchanged when the lexicon has no dictionary.
pub fn autocorrect_text(text: &str, lexicon: &Lexicon) -> String {
    if !lexicon.has_dictionary() {
        return text.to_string();
    }

    let raw: Vec<&str> = text.split_whitespace().collect();
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let token = Token::parse(raw[i]);
        if is_protected(token.core, lexicon) || lexicon.is_known(token.core) == Some(true) {
            out.push(raw[i].to_string());
            i += 1;
            continue;
        }

        // a word broken in two by the recogniser
        if let Some(next) = raw.get(i + 1).map(|r| Token::parse(r)) {
            if token.trail.is_empty()
                && next.lead.is_empty()
                && !next.core.is_empty()
                && next.core.chars().all(char::is_alphabetic)
            {
                let merged = format!("{}{}", token.core, next.core);
                if lexicon.is_known(&merged) == Some(true) {
                    trace!("merged '{}' + '{}'", token.core, next.core);
                    out.push(format!("{}{}{}", token.lead, merged, next.trail));
                    i += 2;
                    continue;
                }
            }
        }

        let corrected = if token.core.chars().count() > 2 {
            lexicon
                .best_suggestion(token.core)
                .filter(|s| !is_number_variant(token.core, s))
        } else {
            None
        };

        match corrected {
            Some(suggestion) => {
                trace!("corrected '{}' to '{}'", token.core, suggestion);
                out.push(format!(
                    "{}{}{}",
                    token.lead,
                    match_case(token.core, &suggestion),
                    token.trail
                ));
            }
            None => out.push(raw[i].to_string()),
        }
        i += 1;
    }

    out.join(" ")
}

/// A corrected copy of an OCR line; word metadata survives for unchanged words.
pub fn autocorrect_line(line: &DocumentLine, lexicon: &Lexicon) -> DocumentLine {
    let corrected = autocorrect_text(&line.text, lexicon);
    if corrected == line.text {
        line.clone()
    } else {
        line.with_text(corrected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::DocumentLineWord;
    use crate::text::lexicon::WordList;
    use pretty_assertions::assert_eq;

    fn lexicon() -> Lexicon {
        Lexicon::new().with_spell_checker(WordList::new([
            "abstraction", "licence", "holder", "cubic", "metres", "per", "hour", "water", "era",
            "point",
        ]))
    }

    #[test]
    fn test_corrects_to_suggestion_keeping_case_and_punctuation() {
        assert_eq!(autocorrect_text("Abstractoin pointt:", &lexicon()), "Abstraction point:");
        assert_eq!(autocorrect_text("WATEER", &lexicon()), "WATER");
    }

    #[test]
    fn test_merges_split_words() {
        assert_eq!(autocorrect_text("lic ence holder", &lexicon()), "licence holder");
    }

    #[test]
    fn test_rejects_plural_variant() {
        assert_eq!(autocorrect_text("5 cubic metre", &lexicon()), "5 cubic metre");
    }

    #[test]
    fn test_protected_tokens_are_untouched() {
        let lexicon = lexicon();
        assert_eq!(autocorrect_text("NRA", &lexicon), "NRA");
        assert_eq!(autocorrect_text("J.R. Hartley", &lexicon), "J.R. Hartley");
        assert_eq!(autocorrect_text("25/68/001/247", &lexicon), "25/68/001/247");
    }

    #[test]
    fn test_without_dictionary_text_is_unchanged() {
        assert_eq!(autocorrect_text("Abstractoin", &Lexicon::new()), "Abstractoin");
    }

    #[test]
    fn test_line_keeps_metadata_of_unchanged_words() {
        let line = DocumentLine::from_words(
            vec![
                DocumentLineWord::new("cubic").with_confidence(91.0),
                DocumentLineWord::new("metrse").with_confidence(40.0),
            ],
            7,
            2,
        );
        let corrected = autocorrect_line(&line, &lexicon());
        assert_eq!(corrected.text, "cubic metres");
        assert_eq!(corrected.line_number, 7);
        assert_eq!(corrected.words[0].ocr_confidence, Some(91.0));
        assert_eq!(corrected.words[1].ocr_confidence, None);
    }
}
