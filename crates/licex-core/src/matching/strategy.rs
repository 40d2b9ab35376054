//! Positional strategies and their eligibility per anchor position.

use std::sync::Arc;

use super::context::LineContext;
use super::{between, category, directional, split, succession};
use crate::models::label::{LabelToMatch, Position};
use crate::models::result::LabelGroupResult;

/// One positional matching algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Payload after the anchor: same line, joined with the next line, then next lines.
    Following,
    /// Payload before the anchor: same line, then previous lines nearest first.
    Preceding,
    /// The label's format extractor on the anchored segment.
    Segment,
    /// Every line between a start and an end anchor.
    Between,
    /// Line cut in two at the anchor.
    Split,
    /// Value nearest to a categorised sibling.
    RelatedCategory,
    /// All anchors present in the line window.
    Succession,
}

impl Strategy {
    /// Eligible strategies for a position, highest priority first.
    pub fn for_position(position: Position) -> &'static [Strategy] {
        use Strategy::*;
        match position {
            Position::ApplicableToAll => &[Segment, Between],
            Position::LabelIsBeforeTextToFind => &[Following, Segment],
            Position::LabelIsAfterTextToFind => &[Preceding, Segment],
            Position::LabelIsBeforeAndOrAfterTextToFindPreferLabelToBeBefore => {
                &[Following, Preceding, Segment]
            }
            Position::LabelIsBeforeAndOrAfterTextToFindPreferLabelToBeAfter => {
                &[Preceding, Following, Segment]
            }
            Position::TextToFindIsBetweenLabels => &[Between],
            Position::Split => &[Split],
            Position::RelatedCategoryPosition => &[RelatedCategory],
            Position::ContractIsSuccession => &[Succession],
        }
    }

    /// Run the strategy on an anchored line.
    pub fn run(self, ctx: &LineContext<'_>, label: &Arc<LabelToMatch>) -> Vec<LabelGroupResult> {
        match self {
            Strategy::Following => directional::following(ctx, label),
            Strategy::Preceding => directional::preceding(ctx, label),
            Strategy::Segment => directional::segment(ctx, label),
            Strategy::Between => between::between(ctx, label),
            Strategy::Split => split::split(ctx, label),
            Strategy::RelatedCategory => {
                category::related_category(label, ctx.lines, ctx.siblings, ctx.lexicon, ctx.seed)
            }
            Strategy::Succession => succession::succession(ctx, label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_preferred_direction_runs_first() {
        assert_eq!(
            Strategy::for_position(Position::LabelIsBeforeAndOrAfterTextToFindPreferLabelToBeAfter),
            &[Strategy::Preceding, Strategy::Following, Strategy::Segment]
        );
        assert_eq!(
            Strategy::for_position(Position::LabelIsBeforeAndOrAfterTextToFindPreferLabelToBeBefore)[0],
            Strategy::Following
        );
    }

    #[test]
    fn test_generic_capture_runs_last_for_applicable_to_all() {
        assert_eq!(
            Strategy::for_position(Position::ApplicableToAll),
            &[Strategy::Segment, Strategy::Between]
        );
    }
}
