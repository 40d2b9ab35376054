//! Declarative label specification: what to look for and where.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, LicexError};
use crate::text::exclusion::compile_rule;

/// Anchor sentinel matching the first line of the current block.
pub const START_OF_BLOCK: &str = "[START_OF_BLOCK]";

/// Anchor sentinel matching the end of the lookahead window.
pub const END_OF_BLOCK: &str = "[END_OF_BLOCK]";

/// Where the payload sits relative to the anchor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Position {
    /// Run every format extractor on the matched segment.
    #[default]
    ApplicableToAll,
    /// Payload follows the anchor.
    LabelIsBeforeTextToFind,
    /// Payload precedes the anchor.
    LabelIsAfterTextToFind,
    /// Payload on either side, following side first.
    LabelIsBeforeAndOrAfterTextToFindPreferLabelToBeBefore,
    /// Payload on either side, preceding side first.
    LabelIsBeforeAndOrAfterTextToFindPreferLabelToBeAfter,
    /// Payload is every line between a start and an end anchor.
    TextToFindIsBetweenLabels,
    /// Line is cut in two at the anchor.
    Split,
    /// Value chosen by proximity to a categorised sibling.
    RelatedCategoryPosition,
    /// Every anchor must be present; marks a succession document.
    ContractIsSuccession,
}

/// Result-type tag selecting the value extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    CompanyName,
    Number,
    LicenceNumber,
    Units,
    #[default]
    Text,
    DateOrPurpose,
    SingleWord,
    ActsLikeSingleWord,
    LinkedLicence,
}

/// Cardinality policy for a label group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Multiple {
    /// First successful match wins.
    #[default]
    None,
    /// Every match of the first matching label.
    SingleLabelMultipleValues,
    /// Every match of every label.
    MultipleLabelsMultipleValues,
    /// Every fragment merged into one multi-line result.
    SingleLabelSingleValueMultipleLines,
}

impl Multiple {
    /// Whether scanning continues after the first match.
    pub fn collects_all(self) -> bool {
        !matches!(self, Multiple::None)
    }
}

/// Literal or regex exclusion applied to candidate text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoveRule {
    pub pattern: String,
    #[serde(default)]
    pub is_regex: bool,
    /// Drop the whole line when the rule fires.
    #[serde(default)]
    pub whole_line: bool,
    /// Only fire when the match starts the line.
    #[serde(default)]
    pub must_be_line_start: bool,
}

impl RemoveRule {
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            is_regex: false,
            whole_line: false,
            must_be_line_start: false,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            is_regex: true,
            ..Self::literal(pattern)
        }
    }

    pub fn whole_line(mut self) -> Self {
        self.whole_line = true;
        self
    }

    pub fn at_line_start(mut self) -> Self {
        self.must_be_line_start = true;
        self
    }
}

/// A node of the label specification tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelToMatch {
    /// Label name; sub-labels sharing a name are alternatives of one group.
    pub name: String,
    /// Anchor phrases in priority order.
    pub text_start: Vec<String>,
    pub text_end: Vec<String>,
    /// At least one of these must appear in a between-capture.
    pub must_contain: Vec<String>,
    pub remove: Vec<RemoveRule>,
    pub position: Position,
    pub format: Format,
    pub possibilities: Vec<String>,
    pub category_name: Option<String>,
    pub related_category_name: Option<String>,
    pub related_name: Option<String>,
    pub minimum_sub_matches: usize,
    pub multiple: Multiple,
    pub previous_lines_to_fetch: usize,
    pub next_lines_to_fetch: usize,
    pub include_label_text: bool,
    pub sub_labels: Vec<Arc<LabelToMatch>>,
}

impl LabelToMatch {
    pub fn new(name: impl Into<String>, position: Position, format: Format) -> Self {
        Self {
            name: name.into(),
            position,
            format,
            ..Default::default()
        }
    }

    pub fn starts_with<S: Into<String>>(mut self, anchors: impl IntoIterator<Item = S>) -> Self {
        self.text_start = anchors.into_iter().map(Into::into).collect();
        self
    }

    pub fn ends_with<S: Into<String>>(mut self, anchors: impl IntoIterator<Item = S>) -> Self {
        self.text_end = anchors.into_iter().map(Into::into).collect();
        self
    }

    pub fn must_contain<S: Into<String>>(mut self, phrases: impl IntoIterator<Item = S>) -> Self {
        self.must_contain = phrases.into_iter().map(Into::into).collect();
        self
    }

    pub fn removing(mut self, rule: RemoveRule) -> Self {
        self.remove.push(rule);
        self
    }

    pub fn with_possibilities<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.possibilities = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category_name = Some(category.into());
        self
    }

    /// Link to the sibling named `name`, optionally within a category.
    pub fn related_to(mut self, category: Option<&str>, name: impl Into<String>) -> Self {
        self.related_category_name = category.map(str::to_string);
        self.related_name = Some(name.into());
        self
    }

    pub fn with_multiple(mut self, multiple: Multiple) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn with_window(mut self, previous: usize, next: usize) -> Self {
        self.previous_lines_to_fetch = previous;
        self.next_lines_to_fetch = next;
        self
    }

    pub fn including_label_text(mut self) -> Self {
        self.include_label_text = true;
        self
    }

    pub fn with_sub_label(mut self, label: LabelToMatch) -> Self {
        self.sub_labels.push(Arc::new(label));
        self
    }

    pub fn with_minimum_sub_matches(mut self, minimum: usize) -> Self {
        self.minimum_sub_matches = minimum;
        self
    }

    /// Whether `[END_OF_BLOCK]` is an accepted end anchor.
    pub fn accepts_end_of_block(&self) -> bool {
        self.text_end.iter().any(|t| t == END_OF_BLOCK)
    }

    /// Whether the label needs anchor text to locate candidates.
    pub fn needs_anchor(&self) -> bool {
        self.format != Format::LinkedLicence && self.position != Position::RelatedCategoryPosition
    }

    /// Check the label and its sub-labels for configuration errors.
    pub fn validate(&self) -> Result<(), LabelError> {
        let has_text = self.text_start.iter().any(|t| !t.trim().is_empty());

        if self.position == Position::Split && !has_text {
            return Err(LabelError::SplitWithoutText(self.name.clone()));
        }
        if self.format == Format::LinkedLicence && self.related_name.is_none() {
            return Err(LabelError::LinkedWithoutRelatedName(self.name.clone()));
        }
        if self.position == Position::RelatedCategoryPosition && self.related_name.is_none() {
            return Err(LabelError::CategoryWithoutRelatedName(self.name.clone()));
        }
        if self.format == Format::Units && self.possibilities.is_empty() {
            return Err(LabelError::UnitsWithoutPossibilities(self.name.clone()));
        }
        if self.needs_anchor() && !has_text {
            return Err(LabelError::MissingAnchor(self.name.clone()));
        }

        for rule in &self.remove {
            if let Err(e) = compile_rule(rule) {
                return Err(LabelError::InvalidPattern {
                    label: self.name.clone(),
                    pattern: rule.pattern.clone(),
                    reason: e.to_string(),
                });
            }
        }

        self.sub_labels.iter().try_for_each(|sub| sub.validate())
    }
}

/// A named category of fact with alternative label specifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelGroup {
    pub name: String,
    pub labels: Vec<Arc<LabelToMatch>>,
}

impl LabelGroup {
    pub fn new(name: impl Into<String>, labels: impl IntoIterator<Item = LabelToMatch>) -> Self {
        Self {
            name: name.into(),
            labels: labels.into_iter().map(Arc::new).collect(),
        }
    }
}

/// The full specification for one extraction run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelSpec {
    pub groups: Vec<LabelGroup>,
}

impl LabelSpec {
    pub fn new(groups: Vec<LabelGroup>) -> Self {
        Self { groups }
    }

    /// Parse and validate a JSON specification.
    pub fn from_json(json: &str) -> Result<Self, LicexError> {
        let spec: LabelSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load and validate a JSON specification file.
    pub fn from_file(path: &Path) -> Result<Self, LicexError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Validate every label of every group.
    pub fn validate(&self) -> Result<(), LabelError> {
        self.groups
            .iter()
            .flat_map(|g| g.labels.iter())
            .try_for_each(|label| label.validate())
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&LabelGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Group sub-labels by name, in order of first appearance.
pub fn group_by_name(labels: &[Arc<LabelToMatch>]) -> Vec<LabelGroup> {
    let mut groups: Vec<LabelGroup> = Vec::new();
    for label in labels {
        match groups.iter_mut().find(|g| g.name == label.name) {
            Some(group) => group.labels.push(Arc::clone(label)),
            None => groups.push(LabelGroup {
                name: label.name.clone(),
                labels: vec![Arc::clone(label)],
            }),
        }
    }
    groups
}
