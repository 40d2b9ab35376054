//! Result tree produced by label matching.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::document::DocumentLine;
use super::label::{Format, LabelToMatch, Multiple, Position, RemoveRule, START_OF_BLOCK};

/// How a match was found, ranked from most to least direct.
///
/// Used for reporting only; never drives control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    SameLineOneLine,
    SameLineTwoLines,
    NearNextLine,
    NearPreviousLine,
    Between,
    SingleWord,
    Split,
    RelatedCategory,
    Succession,
    LinkedLicence,
}

impl MatchType {
    /// Numeric rank, higher is more direct.
    pub fn rank(self) -> u8 {
        match self {
            MatchType::SameLineOneLine => 10,
            MatchType::SameLineTwoLines => 9,
            MatchType::NearNextLine => 8,
            MatchType::NearPreviousLine => 7,
            MatchType::Between => 6,
            MatchType::SingleWord => 5,
            MatchType::Split => 4,
            MatchType::RelatedCategory => 3,
            MatchType::Succession => 2,
            MatchType::LinkedLicence => 1,
        }
    }
}

impl PartialOrd for MatchType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatchType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// The label that produced a match, parameterised with what actually fired.
///
/// Shares the immutable specification node rather than copying it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedLabel {
    pub label: Arc<LabelToMatch>,
    /// Anchor phrase that located the match.
    pub matched_text_start: Option<String>,
    /// End anchor that closed a between-capture.
    pub matched_text_end: Option<String>,
    /// Exclusion rules that fired on the captured text.
    pub used_removals: Vec<RemoveRule>,
}

impl MatchedLabel {
    pub fn new(label: &Arc<LabelToMatch>) -> Self {
        Self {
            label: Arc::clone(label),
            matched_text_start: None,
            matched_text_end: None,
            used_removals: Vec::new(),
        }
    }

    pub fn with_start(mut self, anchor: impl Into<String>) -> Self {
        self.matched_text_start = Some(anchor.into());
        self
    }

    pub fn with_end(mut self, anchor: impl Into<String>) -> Self {
        self.matched_text_end = Some(anchor.into());
        self
    }

    /// Record fired exclusions, skipping ones already recorded.
    pub fn record_removals(&mut self, rules: impl IntoIterator<Item = RemoveRule>) {
        for rule in rules {
            if !self.used_removals.contains(&rule) {
                self.used_removals.push(rule);
            }
        }
    }

    /// Whether the match was located only by the block-start sentinel.
    pub fn anchored_at_block_start(&self) -> bool {
        self.matched_text_start.as_deref() == Some(START_OF_BLOCK)
    }
}

#[derive(Serialize)]
struct MatchedLabelView<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_start: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_end: Option<&'a str>,
    position: Position,
    format: Format,
    multiple: Multiple,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    related_name: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    remove: &'a [RemoveRule],
}

// Reports never echo sub_labels; the result tree already mirrors them.
impl Serialize for MatchedLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MatchedLabelView {
            name: &self.label.name,
            text_start: self.matched_text_start.as_deref(),
            text_end: self.matched_text_end.as_deref(),
            position: self.label.position,
            format: self.label.format,
            multiple: self.label.multiple,
            category_name: self.label.category_name.as_deref(),
            related_name: self.label.related_name.as_deref(),
            remove: &self.used_removals,
        }
        .serialize(serializer)
    }
}

/// One matched label, with the matches of its sub-labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelGroupResult {
    pub text: Vec<DocumentLine>,
    pub match_type: MatchType,
    pub is_ocr: bool,
    pub line_number: usize,
    pub page_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    pub label_group_name: String,
    pub matched_label: MatchedLabel,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_results: Vec<LabelGroupResult>,
}

impl LabelGroupResult {
    /// Captured text joined into one value.
    pub fn value(&self) -> String {
        self.text
            .iter()
            .map(|l| l.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Direct sub-result by group name.
    pub fn sub_result(&self, name: &str) -> Option<&LabelGroupResult> {
        self.sub_results.iter().find(|r| r.label_group_name == name)
    }

    /// Depth-first search through this result and its descendants.
    pub fn find(&self, name: &str) -> Option<&LabelGroupResult> {
        if self.label_group_name == name {
            return Some(self);
        }
        self.sub_results.iter().find_map(|r| r.find(name))
    }

    /// Depth of the sub-result tree below this node.
    pub fn depth(&self) -> usize {
        self.sub_results
            .iter()
            .map(|r| r.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Shared fields of every result built during one match attempt.
///
/// Strategies start from a clone, so a failed attempt never touches siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSeed {
    pub label_group_name: String,
    pub is_ocr: bool,
    pub service_name: Option<String>,
}

impl ResultSeed {
    pub fn new(label_group_name: impl Into<String>, is_ocr: bool, service_name: Option<String>) -> Self {
        Self {
            label_group_name: label_group_name.into(),
            is_ocr,
            service_name,
        }
    }

    /// Build a result positioned at the first captured line.
    pub fn build(
        &self,
        matched_label: MatchedLabel,
        match_type: MatchType,
        text: Vec<DocumentLine>,
    ) -> LabelGroupResult {
        let (line_number, page_number) = text
            .first()
            .map(|l| (l.line_number, l.page_number))
            .unwrap_or((0, 0));
        LabelGroupResult {
            text,
            match_type,
            is_ocr: self.is_ocr,
            line_number,
            page_number,
            service_name: self.service_name.clone(),
            label_group_name: self.label_group_name.clone(),
            matched_label,
            sub_results: Vec::new(),
        }
    }
}

/// Non-fatal conditions worth surfacing next to the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    /// A linked licence number has no entry in the lookup table.
    MissingLicenceMapping { licence_number: String, label: String },
    /// A linked document was already extracted in this run.
    LinkCycleSkipped { path: PathBuf },
    /// Link following stopped at the depth cap.
    LinkDepthExceeded { path: PathBuf, depth: usize },
}

/// Complete extraction output for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentResult {
    pub filename: String,
    pub matches: Vec<LabelGroupResult>,
    pub number_of_pages: u32,
    pub scanned_file: bool,
    pub services_used: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ExtractionWarning>,
}

impl DocumentResult {
    /// Top-level matches of one group.
    pub fn group(&self, name: &str) -> Vec<&LabelGroupResult> {
        self.matches
            .iter()
            .filter(|m| m.label_group_name == name)
            .collect()
    }

    /// First value found for a group name anywhere in the tree.
    pub fn find_value(&self, name: &str) -> Option<String> {
        self.matches.iter().find_map(|m| m.find(name)).map(|r| r.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_result() -> LabelGroupResult {
        let label = Arc::new(
            LabelToMatch::new("Company", Position::LabelIsBeforeTextToFind, Format::CompanyName)
                .starts_with(["Licence holder"])
                .with_sub_label(
                    LabelToMatch::new("Address", Position::LabelIsBeforeTextToFind, Format::Text)
                        .starts_with(["Address"]),
                ),
        );
        let sub_label = Arc::clone(&label.sub_labels[0]);
        let seed = ResultSeed::new("Company", false, None);
        let mut result = seed.build(
            MatchedLabel::new(&label).with_start("Licence holder"),
            MatchType::SameLineOneLine,
            vec![DocumentLine::new("Acme Water Limited", 4, 1)],
        );
        result.sub_results.push(ResultSeed::new("Address", false, None).build(
            MatchedLabel::new(&sub_label).with_start("Address"),
            MatchType::NearNextLine,
            vec![DocumentLine::new("1 High Street", 5, 1)],
        ));
        result
    }

    #[test]
    fn test_match_type_ranking() {
        assert!(MatchType::SameLineOneLine > MatchType::SameLineTwoLines);
        assert!(MatchType::NearNextLine > MatchType::NearPreviousLine);
        assert!(MatchType::Between > MatchType::SingleWord);
    }

    #[test]
    fn test_clone_is_independent_of_original() {
        let original = sample_result();
        let mut copy = original.clone();

        copy.text[0] = copy.text[0].with_text("Other Limited");
        copy.sub_results[0].text.clear();
        Arc::make_mut(&mut copy.matched_label.label)
            .possibilities
            .push("litres".to_string());

        assert_eq!(original.value(), "Acme Water Limited");
        assert_eq!(original.sub_results[0].value(), "1 High Street");
        assert!(original.matched_label.label.possibilities.is_empty());
    }

    #[test]
    fn test_seed_positions_result_at_first_line() {
        let result = sample_result();
        assert_eq!(result.line_number, 4);
        assert_eq!(result.page_number, 1);
        assert_eq!(result.depth(), 1);
        assert_eq!(result.find("Address").map(|r| r.line_number), Some(5));
    }

    #[test]
    fn test_serialized_label_omits_sub_labels() {
        let json = serde_json::to_value(sample_result()).unwrap();
        let label = &json["matched_label"];
        assert_eq!(label["name"], "Company");
        assert_eq!(label["text_start"], "Licence holder");
        assert!(label.get("sub_labels").is_none());
        assert_eq!(json["sub_results"][0]["label_group_name"], "Address");
        assert_eq!(json["match_type"], "same_line_one_line");
    }
}
