//! Label-before and label-after strategies, and format extraction on a segment.

use std::sync::Arc;

use tracing::trace;

use super::context::LineContext;
use crate::models::document::DocumentLine;
use crate::models::label::{Format, LabelToMatch};
use crate::models::result::{LabelGroupResult, MatchType};
use crate::text::exclusion::apply_removals;
use crate::text::lexicon::Lexicon;
use crate::text::{corruption, names, values};

/// Values the label's format recognises in the text.
///
/// Linked licences resolve through sibling results and never match text.
pub fn extract_values(label: &LabelToMatch, text: &str, lexicon: &Lexicon) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    match label.format {
        Format::CompanyName => names::recognise_name(text, lexicon).into_iter().collect(),
        Format::Number => values::find_number(text).into_iter().collect(),
        Format::LicenceNumber => values::find_licence_numbers(text),
        Format::Units => values::match_units(text, &label.possibilities).into_iter().collect(),
        Format::Text => {
            if corruption::is_corrupted(text, lexicon) {
                Vec::new()
            } else {
                vec![text.to_string()]
            }
        }
        Format::DateOrPurpose => {
            if values::is_date_or_purpose(text) {
                vec![text.to_string()]
            } else {
                Vec::new()
            }
        }
        Format::SingleWord => values::first_word(text).into_iter().collect(),
        Format::ActsLikeSingleWord => vec![text.to_string()],
        Format::LinkedLicence => Vec::new(),
    }
}

/// Apply exclusions to a segment and extract values, one result per value.
pub(crate) fn capture(
    ctx: &LineContext<'_>,
    label: &Arc<LabelToMatch>,
    line: &DocumentLine,
    segment: &str,
    match_type: MatchType,
) -> Vec<LabelGroupResult> {
    let exclusion = apply_removals(segment, &label.remove);
    let Some(text) = exclusion.text else {
        return Vec::new();
    };

    extract_values(label, &text, ctx.lexicon)
        .into_iter()
        .map(|value| {
            let mut result = ctx.build(label, match_type, vec![line.with_text(value)]);
            result.matched_label.record_removals(exclusion.fired.iter().cloned());
            result
        })
        .collect()
}

// Numbers are worth reading out of noisy lines; everything else skips them.
fn is_candidate(line: &DocumentLine, label: &LabelToMatch, lexicon: &Lexicon) -> bool {
    !line.is_blank() && (label.format == Format::Number || !corruption::is_corrupted(&line.text, lexicon))
}

fn following_segment<'a>(ctx: &LineContext<'a>, label: &LabelToMatch) -> &'a str {
    if label.include_label_text {
        ctx.from_anchor()
    } else {
        ctx.after()
    }
}

fn preceding_segment<'a>(ctx: &LineContext<'a>, label: &LabelToMatch) -> &'a str {
    if label.include_label_text {
        ctx.through_anchor()
    } else {
        ctx.before()
    }
}

/// Label sits before its payload.
pub fn following(ctx: &LineContext<'_>, label: &Arc<LabelToMatch>) -> Vec<LabelGroupResult> {
    let line = ctx.line();
    let segment = following_segment(ctx, label);

    let results = capture(ctx, label, line, segment, MatchType::SameLineOneLine);
    if !results.is_empty() {
        return results;
    }

    let window = ctx.next(label.next_lines_to_fetch.max(1));

    if !segment.is_empty() {
        if let Some(next) = window.iter().find(|l| !l.is_blank()) {
            let joined = format!("{} {}", segment, next.text.trim());
            let results = capture(ctx, label, line, &joined, MatchType::SameLineTwoLines);
            if !results.is_empty() {
                trace!("{}: joined with line {}", label.name, next.line_number);
                return results;
            }
        }
    }

    for next in window.iter().filter(|l| is_candidate(l, label, ctx.lexicon)) {
        let results = capture(ctx, label, next, &next.text, MatchType::NearNextLine);
        if !results.is_empty() {
            return results;
        }
    }

    Vec::new()
}

/// Label sits after its payload.
pub fn preceding(ctx: &LineContext<'_>, label: &Arc<LabelToMatch>) -> Vec<LabelGroupResult> {
    let line = ctx.line();
    let segment = preceding_segment(ctx, label);

    let results = capture(ctx, label, line, segment, MatchType::SameLineOneLine);
    if !results.is_empty() {
        return results;
    }

    let window = ctx.previous(label.previous_lines_to_fetch.max(1));

    if label.format == Format::CompanyName {
        // names wrapped over several lines directly above the label
        let block: Vec<&DocumentLine> = window
            .iter()
            .rev()
            .take_while(|l| !l.is_blank() && !corruption::is_corrupted(&l.text, ctx.lexicon))
            .collect();
        if block.len() > 1 {
            let joined = block
                .iter()
                .rev()
                .map(|l| l.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            let first = block[block.len() - 1];
            let results = capture(ctx, label, first, &joined, MatchType::NearPreviousLine);
            if !results.is_empty() {
                return results;
            }
        }
    }

    for previous in window.iter().rev().filter(|l| is_candidate(l, label, ctx.lexicon)) {
        let results = capture(ctx, label, previous, &previous.text, MatchType::NearPreviousLine);
        if !results.is_empty() {
            return results;
        }
    }

    Vec::new()
}

/// Format extraction on the anchored segment alone.
///
/// Only the label's own `format` extractor runs, for `ApplicableToAll` too;
/// a segment that holds some other kind of value yields nothing.
pub fn segment(ctx: &LineContext<'_>, label: &Arc<LabelToMatch>) -> Vec<LabelGroupResult> {
    let text = if label.include_label_text || ctx.anchor.is_block_start() {
        ctx.from_anchor()
    } else {
        ctx.after()
    };
    let match_type = match label.format {
        Format::SingleWord | Format::ActsLikeSingleWord => MatchType::SingleWord,
        _ => MatchType::SameLineOneLine,
    };
    capture(ctx, label, ctx.line(), text, match_type)
}
