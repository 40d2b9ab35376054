//! Capture of every line between a start and an end anchor.

use std::sync::Arc;

use tracing::trace;

use super::context::{find_end, find_phrase, trim_separators, LineContext};
use crate::models::document::DocumentLine;
use crate::models::label::{LabelToMatch, RemoveRule, END_OF_BLOCK};
use crate::models::result::{LabelGroupResult, MatchType};
use crate::text::exclusion::apply_removals_to_line;

/// Lines captured between the anchors and the end anchor that closed them.
struct Span {
    lines: Vec<DocumentLine>,
    end: String,
}

fn collect_span(ctx: &LineContext<'_>, label: &LabelToMatch) -> Option<Span> {
    let line = ctx.line();
    let remainder = if label.include_label_text {
        ctx.from_anchor()
    } else {
        trim_separators(&line.text[ctx.anchor.end..])
    };

    if let Some((end, pos)) = find_end(label, remainder) {
        let inside = remainder[..pos].trim();
        let lines = if inside.is_empty() {
            Vec::new()
        } else {
            vec![line.with_text(inside)]
        };
        return Some(Span { lines, end });
    }

    let mut lines = Vec::new();
    if !remainder.is_empty() {
        lines.push(line.with_text(remainder));
    }

    let window = match label.next_lines_to_fetch {
        0 => ctx.rest(),
        n => ctx.next(n),
    };
    for candidate in window {
        if let Some((end, pos)) = find_end(label, &candidate.text) {
            let prefix = candidate.text[..pos].trim();
            if !prefix.is_empty() {
                lines.push(candidate.with_text(prefix));
            }
            return Some(Span { lines, end });
        }
        if !candidate.is_blank() {
            lines.push(candidate.clone());
        }
    }

    if label.accepts_end_of_block() {
        Some(Span {
            lines,
            end: END_OF_BLOCK.to_string(),
        })
    } else {
        None
    }
}

/// Every line from the start anchor up to the first end anchor.
///
/// `[END_OF_BLOCK]` closes the capture at the end of the lookahead window,
/// or the end of the stream when no window is set.
pub fn between(ctx: &LineContext<'_>, label: &Arc<LabelToMatch>) -> Vec<LabelGroupResult> {
    if label.text_end.is_empty() {
        return Vec::new();
    }
    let Some(span) = collect_span(ctx, label) else {
        return Vec::new();
    };

    let mut fired: Vec<RemoveRule> = Vec::new();
    let lines: Vec<DocumentLine> = span
        .lines
        .iter()
        .filter_map(|line| {
            let (kept, rules) = apply_removals_to_line(line, &label.remove);
            fired.extend(rules);
            kept.filter(|l| !l.is_blank())
        })
        .collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let joined = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if !label.must_contain.is_empty()
        && !label.must_contain.iter().any(|p| find_phrase(&joined, p).is_some())
    {
        trace!("{}: capture lacks all of {:?}", label.name, label.must_contain);
        return Vec::new();
    }

    let matched_label = ctx.matched_label(label).with_end(span.end);
    let mut result = ctx.seed.build(matched_label, MatchType::Between, lines);
    result.matched_label.record_removals(fired);
    vec![result]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::context::find_anchor;
    use crate::models::label::{Format, Position};
    use crate::models::result::ResultSeed;
    use crate::text::lexicon::Lexicon;
    use pretty_assertions::assert_eq;

    fn capture(rows: &[&str], label: LabelToMatch) -> Vec<LabelGroupResult> {
        let lines: Vec<DocumentLine> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| DocumentLine::new(*r, i, 1))
            .collect();
        let label = Arc::new(label);
        let lexicon = Lexicon::new();
        let seed = ResultSeed::new(label.name.clone(), false, None);
        let (index, anchor) = lines
            .iter()
            .enumerate()
            .find_map(|(i, _)| find_anchor(&label, &lines, i).map(|a| (i, a)))
            .unwrap();
        let ctx = LineContext {
            lines: &lines,
            index,
            anchor,
            siblings: &[],
            lexicon: &lexicon,
            seed: &seed,
        };
        between(&ctx, &label)
    }

    fn block_label() -> LabelToMatch {
        LabelToMatch::new("Block", Position::TextToFindIsBetweenLabels, Format::Text)
            .starts_with(["START"])
            .ends_with(["END", END_OF_BLOCK])
    }

    #[test]
    fn test_end_of_block_closes_at_end_of_stream() {
        let results = capture(&["START", "first", "second", "third"], block_label());
        assert_eq!(results.len(), 1);
        let texts: Vec<&str> = results[0].text.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(results[0].matched_label.matched_text_end.as_deref(), Some(END_OF_BLOCK));
        assert_eq!(results[0].match_type, MatchType::Between);
    }

    #[test]
    fn test_literal_end_wins_over_sentinel() {
        let results = capture(&["START here", "first", "second END tail", "third"], block_label());
        let texts: Vec<&str> = results[0].text.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["here", "first", "second"]);
        assert_eq!(results[0].matched_label.matched_text_end.as_deref(), Some("END"));
    }

    #[test]
    fn test_end_on_the_start_line() {
        let results = capture(&["START payload END", "after"], block_label());
        assert_eq!(results[0].value(), "payload");
    }

    #[test]
    fn test_missing_end_without_sentinel_is_a_miss() {
        let label = block_label().ends_with(["END"]);
        assert!(capture(&["START", "first"], label).is_empty());
    }

    #[test]
    fn test_lookahead_window_bounds_the_sentinel() {
        let label = block_label().with_window(0, 2);
        let results = capture(&["START", "first", "second", "third"], label);
        assert_eq!(results[0].text.len(), 2);
    }

    #[test]
    fn test_must_contain() {
        let label = block_label().must_contain(["second"]);
        assert_eq!(capture(&["START", "first", "second"], label.clone()).len(), 1);
        assert!(capture(&["START", "first", "third"], label).is_empty());
    }

    #[test]
    fn test_must_contain_needs_any_one_phrase() {
        let label = block_label().must_contain(["second", "fourth"]);
        assert_eq!(capture(&["START", "first", "second"], label.clone()).len(), 1);
        assert_eq!(capture(&["START", "fourth"], label.clone()).len(), 1);
        assert!(capture(&["START", "first", "third"], label).is_empty());
    }
}
