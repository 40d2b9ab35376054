//! Visitation state for one matching pass.

use std::collections::HashSet;
use std::sync::Arc;

use crate::models::label::LabelToMatch;
use crate::models::result::ExtractionWarning;

/// Mutable bookkeeping kept next to the immutable label tree.
///
/// Labels are keyed by identity, so two structurally equal labels in
/// different groups are tracked separately.
#[derive(Debug, Default)]
pub struct MatchState {
    completed: HashSet<usize>,
    matched_groups: HashSet<String>,
    warnings: Vec<ExtractionWarning>,
    succession: bool,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(label: &Arc<LabelToMatch>) -> usize {
        Arc::as_ptr(label) as usize
    }

    /// Whether the label already produced its value in this pass.
    pub fn is_completed(&self, label: &Arc<LabelToMatch>) -> bool {
        self.completed.contains(&Self::key(label))
    }

    pub fn complete(&mut self, label: &Arc<LabelToMatch>) {
        self.completed.insert(Self::key(label));
    }

    pub fn is_group_matched(&self, name: &str) -> bool {
        self.matched_groups.contains(name)
    }

    pub fn mark_group_matched(&mut self, name: &str) {
        self.matched_groups.insert(name.to_string());
    }

    pub fn warn(&mut self, warning: ExtractionWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    pub fn warnings(&self) -> &[ExtractionWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<ExtractionWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Whether a succession contract was recognised; remaining groups are skipped.
    pub fn is_succession(&self) -> bool {
        self.succession
    }

    pub fn mark_succession(&mut self) {
        self.succession = true;
    }

    /// Fresh state for a nested sub-label pass.
    pub fn child(&self) -> Self {
        Self::default()
    }

    /// Fold a nested pass back in; only its warnings outlive it.
    pub fn absorb(&mut self, child: MatchState) {
        for warning in child.warnings {
            self.warn(warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::label::{Format, Position};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_completion_is_keyed_by_identity() {
        let a = Arc::new(LabelToMatch::new("X", Position::ApplicableToAll, Format::Text));
        let b = Arc::new((*a).clone());
        let mut state = MatchState::new();

        state.complete(&a);
        assert!(state.is_completed(&a));
        assert!(state.is_completed(&Arc::clone(&a)));
        assert!(!state.is_completed(&b));
    }

    #[test]
    fn test_child_warnings_are_absorbed_once() {
        let warning = ExtractionWarning::MissingLicenceMapping {
            licence_number: "1/2".to_string(),
            label: "Linked".to_string(),
        };
        let mut state = MatchState::new();
        state.warn(warning.clone());

        let mut child = state.child();
        child.mark_group_matched("Sub");
        child.warn(warning.clone());
        state.absorb(child);

        assert_eq!(state.warnings(), &[warning]);
        assert!(!state.is_group_matched("Sub"));
    }
}
