//! Recognition of succession and amendment contracts.

use std::sync::Arc;

use super::context::{find_phrase, LineContext};
use crate::models::label::{LabelToMatch, END_OF_BLOCK, START_OF_BLOCK};
use crate::models::result::{LabelGroupResult, MatchType};

/// Match when every anchor phrase occurs in the line or its context window.
pub fn succession(ctx: &LineContext<'_>, label: &Arc<LabelToMatch>) -> Vec<LabelGroupResult> {
    let window: Vec<&str> = ctx
        .previous(label.previous_lines_to_fetch)
        .iter()
        .chain(std::iter::once(ctx.line()))
        .chain(ctx.next(label.next_lines_to_fetch))
        .map(|l| l.text.as_str())
        .collect();
    let text = window.join(" ");

    let all_found = label
        .text_start
        .iter()
        .filter(|p| p.as_str() != START_OF_BLOCK && p.as_str() != END_OF_BLOCK)
        .all(|phrase| find_phrase(&text, phrase).is_some());
    if !all_found {
        return Vec::new();
    }

    vec![ctx.build(label, MatchType::Succession, vec![ctx.line().clone()])]
}
