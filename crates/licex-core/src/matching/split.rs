//! Cutting a line and its context into before and after spans.

use std::sync::Arc;

use super::context::LineContext;
use crate::models::document::DocumentLine;
use crate::models::label::{LabelToMatch, RemoveRule};
use crate::models::result::{LabelGroupResult, MatchType};
use crate::text::exclusion::apply_removals_to_line;

fn clean_span(lines: Vec<DocumentLine>, label: &LabelToMatch, fired: &mut Vec<RemoveRule>) -> Vec<DocumentLine> {
    lines
        .into_iter()
        .filter(|l| !l.is_blank())
        .filter_map(|line| {
            let (kept, rules) = apply_removals_to_line(&line, &label.remove);
            fired.extend(rules);
            kept.filter(|l| !l.is_blank())
        })
        .collect()
}

/// Split at the anchor; each non-empty side becomes a sub-result.
///
/// The spans take `previous_lines_to_fetch` lines above and
/// `next_lines_to_fetch` lines below the anchored line.
pub fn split(ctx: &LineContext<'_>, label: &Arc<LabelToMatch>) -> Vec<LabelGroupResult> {
    let line = ctx.line();
    let mut fired = Vec::new();

    let mut before: Vec<DocumentLine> = ctx.previous(label.previous_lines_to_fetch).to_vec();
    if !ctx.before().is_empty() {
        before.push(line.with_text(ctx.before()));
    }
    let mut after: Vec<DocumentLine> = Vec::new();
    if !ctx.after().is_empty() {
        after.push(line.with_text(ctx.after()));
    }
    after.extend_from_slice(ctx.next(label.next_lines_to_fetch));

    let spans: Vec<LabelGroupResult> = [before, after]
        .into_iter()
        .map(|span| clean_span(span, label, &mut fired))
        .filter(|span| !span.is_empty())
        .map(|span| ctx.build(label, MatchType::Split, span))
        .collect();
    if spans.is_empty() {
        return Vec::new();
    }

    let mut result = ctx.build(label, MatchType::Split, vec![line.clone()]);
    result.matched_label.record_removals(fired);
    result.sub_results = spans;
    vec![result]
}
