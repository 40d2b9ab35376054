//! Values resolved by proximity to a categorised sibling result.

use std::sync::Arc;

use tracing::debug;

use super::directional::extract_values;
use crate::models::document::DocumentLine;
use crate::models::label::LabelToMatch;
use crate::models::result::{LabelGroupResult, MatchType, MatchedLabel, ResultSeed};
use crate::text::lexicon::Lexicon;

fn collect_related<'a>(
    results: &'a [LabelGroupResult],
    label: &LabelToMatch,
    out: &mut Vec<&'a LabelGroupResult>,
) {
    for result in results {
        let name_matches = label.related_name.as_deref() == Some(result.label_group_name.as_str());
        let category_matches = match label.related_category_name.as_deref() {
            Some(category) => result.matched_label.label.category_name.as_deref() == Some(category),
            None => true,
        };
        if name_matches && category_matches {
            out.push(result);
        }
        collect_related(&result.sub_results, label, out);
    }
}

/// For each related sibling, the nearest line carrying a value of the label's format.
///
/// Distance is measured in line numbers; equal distances go to the earlier line.
pub fn related_category(
    label: &Arc<LabelToMatch>,
    lines: &[DocumentLine],
    siblings: &[LabelGroupResult],
    lexicon: &Lexicon,
    seed: &ResultSeed,
) -> Vec<LabelGroupResult> {
    let mut related = Vec::new();
    collect_related(siblings, label, &mut related);
    if related.is_empty() {
        debug!("{}: no sibling named {:?}", label.name, label.related_name);
        return Vec::new();
    }

    let above = label.previous_lines_to_fetch.max(1);
    let below = label.next_lines_to_fetch.max(1);

    related
        .into_iter()
        .filter_map(|sibling| {
            let anchor = sibling.line_number;
            lines
                .iter()
                .filter(|l| l.line_number + above >= anchor && l.line_number <= anchor + below)
                .filter_map(|l| {
                    extract_values(label, &l.text, lexicon)
                        .into_iter()
                        .next()
                        .map(|value| (l.line_number.abs_diff(anchor), l, value))
                })
                .min_by_key(|(distance, line, _)| (*distance, line.line_number))
                .map(|(_, line, value)| {
                    let mut matched = MatchedLabel::new(label);
                    matched.matched_text_start = sibling.matched_label.matched_text_start.clone();
                    seed.build(matched, MatchType::RelatedCategory, vec![line.with_text(value)])
                })
        })
        .collect()
}
