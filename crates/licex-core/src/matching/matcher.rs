//! Label-group orchestration over one line stream.

use std::sync::Arc;

use tracing::{debug, trace};

use super::category;
use super::context::{find_anchor, LineContext};
use super::state::MatchState;
use super::strategy::Strategy;
use crate::error::Result;
use crate::models::document::DocumentLine;
use crate::models::label::{group_by_name, Format, LabelGroup, LabelToMatch, Multiple, Position};
use crate::models::result::{ExtractionWarning, LabelGroupResult, MatchType, MatchedLabel, ResultSeed};
use crate::text::lexicon::Lexicon;
use crate::text::values::find_licence_numbers;

/// What became of one linked licence number.
#[derive(Debug)]
pub enum LinkOutcome {
    /// The linked document's top-level matches.
    Linked(Vec<LabelGroupResult>),
    /// Not followed, with the reason when it is worth reporting.
    Skipped(Option<ExtractionWarning>),
}

/// Follows licence numbers to other documents.
pub trait LinkResolver {
    fn resolve(&mut self, licence_number: &str, label: &LabelToMatch) -> Result<LinkOutcome>;
}

/// Resolver for runs without a licence lookup; links are never followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLinks;

impl LinkResolver for NoLinks {
    fn resolve(&mut self, _licence_number: &str, _label: &LabelToMatch) -> Result<LinkOutcome> {
        Ok(LinkOutcome::Skipped(None))
    }
}

/// Runs label groups over a line stream from one text source.
pub struct Matcher<'a> {
    lexicon: &'a Lexicon,
    is_ocr: bool,
    service_name: Option<String>,
}

impl<'a> Matcher<'a> {
    /// Matcher for directly extracted text.
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self {
            lexicon,
            is_ocr: false,
            service_name: None,
        }
    }

    /// Tag every result with the OCR service that produced the lines.
    pub fn for_ocr(lexicon: &'a Lexicon, service_name: impl Into<String>) -> Self {
        Self {
            lexicon,
            is_ocr: true,
            service_name: Some(service_name.into()),
        }
    }

    /// Match groups in order, skipping groups already matched in `state`.
    ///
    /// `prior` holds results of earlier passes; they are visible to
    /// related-category and linked-licence labels but not returned.
    /// Groups are taken as already validated; [`DocumentExtractor::new`]
    /// refuses a [`LabelSpec`] that fails [`LabelSpec::validate`].
    ///
    /// [`DocumentExtractor::new`]: crate::extractor::DocumentExtractor::new
    /// [`LabelSpec`]: crate::models::label::LabelSpec
    /// [`LabelSpec::validate`]: crate::models::label::LabelSpec::validate
    pub fn match_groups(
        &self,
        groups: &[LabelGroup],
        lines: &[DocumentLine],
        prior: &[LabelGroupResult],
        state: &mut MatchState,
        links: &mut dyn LinkResolver,
    ) -> Result<Vec<LabelGroupResult>> {
        let mut all: Vec<LabelGroupResult> = prior.to_vec();
        let first_new = all.len();

        for group in groups {
            if state.is_succession() {
                debug!("Succession contract recognised, skipping remaining groups");
                break;
            }
            if state.is_group_matched(&group.name) {
                continue;
            }

            let results = self.match_group(group, lines, &all, state, links)?;
            if results.is_empty() {
                debug!("Group {} unmatched", group.name);
                continue;
            }

            debug!("Group {} matched {} result(s)", group.name, results.len());
            state.mark_group_matched(&group.name);
            all.extend(results);
        }

        Ok(all.split_off(first_new))
    }

    fn match_group(
        &self,
        group: &LabelGroup,
        lines: &[DocumentLine],
        siblings: &[LabelGroupResult],
        state: &mut MatchState,
        links: &mut dyn LinkResolver,
    ) -> Result<Vec<LabelGroupResult>> {
        let seed = ResultSeed::new(group.name.clone(), self.is_ocr, self.service_name.clone());
        let mut collected = Vec::new();

        for label in &group.labels {
            if state.is_completed(label) {
                continue;
            }
            let results = self.match_label(label, &seed, lines, siblings, state, links)?;
            if results.is_empty() {
                continue;
            }
            state.complete(label);

            match label.multiple {
                Multiple::None => {
                    collected.extend(results.into_iter().take(1));
                    break;
                }
                Multiple::SingleLabelMultipleValues => {
                    collected.extend(results);
                    break;
                }
                Multiple::MultipleLabelsMultipleValues => collected.extend(results),
                Multiple::SingleLabelSingleValueMultipleLines => {
                    collected.extend(merge_fragments(results));
                    break;
                }
            }
        }

        Ok(collected)
    }

    fn match_label(
        &self,
        label: &Arc<LabelToMatch>,
        seed: &ResultSeed,
        lines: &[DocumentLine],
        siblings: &[LabelGroupResult],
        state: &mut MatchState,
        links: &mut dyn LinkResolver,
    ) -> Result<Vec<LabelGroupResult>> {
        if label.format == Format::LinkedLicence {
            return self.resolve_links(label, seed, siblings, state, links);
        }
        if label.position == Position::RelatedCategoryPosition {
            let produced = category::related_category(label, lines, siblings, self.lexicon, seed);
            return self.finish(label, produced, lines, state, links);
        }

        let mut found = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            if line.is_blank() {
                continue;
            }
            let Some(anchor) = find_anchor(label, lines, index) else {
                continue;
            };
            let ctx = LineContext {
                lines,
                index,
                anchor,
                siblings,
                lexicon: self.lexicon,
                seed,
            };

            for strategy in Strategy::for_position(label.position) {
                let produced = strategy.run(&ctx, label);
                if produced.is_empty() {
                    continue;
                }
                let finished = self.finish(label, produced, lines, state, links)?;
                if finished.is_empty() {
                    continue;
                }
                trace!("{}: {:?} matched on line {}", label.name, strategy, line.line_number);
                if *strategy == Strategy::Succession {
                    state.mark_succession();
                }
                found.extend(finished);
                break;
            }

            if !found.is_empty() && !label.multiple.collects_all() {
                break;
            }
        }

        Ok(found)
    }

    /// Resolve sub-labels of freshly produced results, dropping invalidated branches.
    fn finish(
        &self,
        label: &Arc<LabelToMatch>,
        produced: Vec<LabelGroupResult>,
        lines: &[DocumentLine],
        state: &mut MatchState,
        links: &mut dyn LinkResolver,
    ) -> Result<Vec<LabelGroupResult>> {
        let mut finished = Vec::with_capacity(produced.len());
        for result in produced {
            if let Some(result) = self.resolve_sub_labels(label, result, lines, state, links)? {
                finished.push(result);
            }
        }
        Ok(finished)
    }

    fn resolve_sub_labels(
        &self,
        label: &Arc<LabelToMatch>,
        mut result: LabelGroupResult,
        lines: &[DocumentLine],
        state: &mut MatchState,
        links: &mut dyn LinkResolver,
    ) -> Result<Option<LabelGroupResult>> {
        if label.position == Position::Split {
            // each span resolves its own sub-labels
            let mut spans = Vec::new();
            for mut span in std::mem::take(&mut result.sub_results) {
                if !label.sub_labels.is_empty() {
                    match self.match_sub_labels(label, &span.text, state, links)? {
                        Some(subs) => span.sub_results = subs,
                        None => continue,
                    }
                }
                spans.push(span);
            }
            if spans.is_empty() {
                return Ok(None);
            }
            result.sub_results = spans;
            return Ok(Some(result));
        }

        if label.sub_labels.is_empty() {
            return Ok(Some(result));
        }

        let subs = if label.format == Format::ActsLikeSingleWord {
            self.match_sub_labels(label, lines, state, links)?
        } else {
            self.match_sub_labels(label, &result.text, state, links)?
        };
        Ok(subs.map(|subs| {
            result.sub_results = subs;
            result
        }))
    }

    /// Sub-label pass over `scope`; `None` when too few sub-labels matched.
    fn match_sub_labels(
        &self,
        label: &LabelToMatch,
        scope: &[DocumentLine],
        state: &mut MatchState,
        links: &mut dyn LinkResolver,
    ) -> Result<Option<Vec<LabelGroupResult>>> {
        let groups = group_by_name(&label.sub_labels);
        let mut child = state.child();
        let subs = self.match_groups(&groups, scope, &[], &mut child, links)?;
        state.absorb(child);

        let subs = drop_block_start_matches(subs);
        if subs.len() < label.minimum_sub_matches {
            trace!(
                "{}: {} sub-match(es), {} required",
                label.name,
                subs.len(),
                label.minimum_sub_matches
            );
            return Ok(None);
        }
        Ok(Some(subs))
    }

    fn resolve_links(
        &self,
        label: &Arc<LabelToMatch>,
        seed: &ResultSeed,
        siblings: &[LabelGroupResult],
        state: &mut MatchState,
        links: &mut dyn LinkResolver,
    ) -> Result<Vec<LabelGroupResult>> {
        let Some(related) = label.related_name.as_deref() else {
            return Ok(Vec::new());
        };
        let mut sources = Vec::new();
        collect_named(siblings, related, &mut sources);

        let mut seen: Vec<String> = Vec::new();
        let mut found = Vec::new();
        'sources: for source in sources {
            for number in find_licence_numbers(&source.value()) {
                if seen.contains(&number) {
                    continue;
                }
                seen.push(number.clone());

                match links.resolve(&number, label)? {
                    LinkOutcome::Linked(matches) => {
                        let mut result = seed.build(
                            MatchedLabel::new(label).with_start(number.clone()),
                            MatchType::LinkedLicence,
                            vec![DocumentLine::new(number, source.line_number, source.page_number)],
                        );
                        result.sub_results = matches;
                        found.push(result);
                        if !label.multiple.collects_all() {
                            break 'sources;
                        }
                    }
                    LinkOutcome::Skipped(Some(warning)) => state.warn(warning),
                    LinkOutcome::Skipped(None) => {}
                }
            }
        }

        Ok(found)
    }
}

fn collect_named<'r>(results: &'r [LabelGroupResult], name: &str, out: &mut Vec<&'r LabelGroupResult>) {
    for result in results {
        if result.label_group_name == name {
            out.push(result);
        }
        collect_named(&result.sub_results, name, out);
    }
}

/// Drop sub-matches located only by the block-start sentinel, unless all were.
fn drop_block_start_matches(subs: Vec<LabelGroupResult>) -> Vec<LabelGroupResult> {
    if subs.iter().all(|s| s.matched_label.anchored_at_block_start()) {
        return subs;
    }
    subs.into_iter()
        .filter(|s| !s.matched_label.anchored_at_block_start())
        .collect()
}

/// Merge fragments of one multi-line value into the first fragment.
fn merge_fragments(results: Vec<LabelGroupResult>) -> Option<LabelGroupResult> {
    let mut iter = results.into_iter();
    let mut merged = iter.next()?;
    for fragment in iter {
        merged.text.extend(fragment.text);
        merged.sub_results.extend(fragment.sub_results);
        merged.matched_label.record_removals(fragment.matched_label.used_removals);
    }
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::label::{RemoveRule, END_OF_BLOCK, START_OF_BLOCK};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lines(rows: &[&str]) -> Vec<DocumentLine> {
        rows.iter()
            .enumerate()
            .map(|(i, r)| DocumentLine::new(*r, i, 1))
            .collect()
    }

    fn run(groups: &[LabelGroup], rows: &[&str]) -> (Vec<LabelGroupResult>, MatchState) {
        let lexicon = Lexicon::new();
        let mut state = MatchState::new();
        let results = Matcher::new(&lexicon)
            .match_groups(groups, &lines(rows), &[], &mut state, &mut NoLinks)
            .unwrap();
        (results, state)
    }

    fn licence_group(multiple: Multiple) -> LabelGroup {
        LabelGroup::new(
            "LicenceNumber",
            [LabelToMatch::new("LicenceNumber", Position::LabelIsBeforeTextToFind, Format::LicenceNumber)
                .starts_with(["Licence No"])
                .with_multiple(multiple)],
        )
    }

    fn abstraction_limit_point() -> LabelToMatch {
        LabelToMatch::new("AbstractionLimitPoint", Position::TextToFindIsBetweenLabels, Format::Text)
            .starts_with([START_OF_BLOCK])
            .ends_with([END_OF_BLOCK])
            .with_minimum_sub_matches(2)
            .with_sub_label(
                LabelToMatch::new("PointPurpose", Position::LabelIsBeforeTextToFind, Format::DateOrPurpose)
                    .starts_with(["Up to and including"])
                    .including_label_text(),
            )
            .with_sub_label(
                LabelToMatch::new("PerHourValue", Position::LabelIsAfterTextToFind, Format::Number)
                    .starts_with(["per hour"]),
            )
            .with_sub_label(
                LabelToMatch::new("PerHourUnits", Position::LabelIsAfterTextToFind, Format::Units)
                    .starts_with(["per hour"])
                    .with_possibilities(["cubic metres", "litres", "megalitres", "gallons"]),
            )
    }

    #[test]
    fn test_abstraction_limit_point_window() {
        let groups = vec![LabelGroup::new("AbstractionLimitPoint", [abstraction_limit_point()])];
        let (results, _) = run(
            &groups,
            &[
                "6.1 Up to and including 31 March 2025",
                "215 cubic metres per hour",
                "4550 cubic metres per day",
            ],
        );

        assert_eq!(results.len(), 1);
        let point = &results[0];
        assert_eq!(point.match_type, MatchType::Between);
        assert_eq!(point.text.len(), 3);
        assert_eq!(point.sub_result("PerHourValue").map(|r| r.value()), Some("215".to_string()));
        assert_eq!(
            point.sub_result("PerHourUnits").map(|r| r.value()),
            Some("cubic metres".to_string())
        );
        assert_eq!(
            point.sub_result("PointPurpose").map(|r| r.value()),
            Some("Up to and including 31 March 2025".to_string())
        );
    }

    #[test]
    fn test_prefer_after_takes_preceding_name() {
        let groups = vec![LabelGroup::new(
            "Company",
            [LabelToMatch::new(
                "Company",
                Position::LabelIsBeforeAndOrAfterTextToFindPreferLabelToBeAfter,
                Format::CompanyName,
            )
            .starts_with(["Licence holder"])],
        )];
        let (results, _) = run(&groups, &["Acme Water Limited", "Licence holder", "Bravo Farms Limited"]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value(), "Acme Water Limited");
        assert_eq!(results[0].match_type, MatchType::NearPreviousLine);
    }

    #[test]
    fn test_single_value_keeps_first_in_line_order() {
        let rows = ["Licence No 1/2/3", "Licence No 4/5/6"];
        let (results, _) = run(&[licence_group(Multiple::None)], &rows);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value(), "1/2/3");

        let (results, _) = run(&[licence_group(Multiple::SingleLabelMultipleValues)], &rows);
        let values: Vec<String> = results.iter().map(|r| r.value()).collect();
        assert_eq!(values, vec!["1/2/3".to_string(), "4/5/6".to_string()]);
    }

    #[test]
    fn test_multiple_labels_multiple_values() {
        let group = LabelGroup::new(
            "Purpose",
            [
                LabelToMatch::new("Purpose", Position::LabelIsBeforeTextToFind, Format::Text)
                    .starts_with(["Purpose"])
                    .with_multiple(Multiple::MultipleLabelsMultipleValues),
                LabelToMatch::new("Purpose", Position::LabelIsBeforeTextToFind, Format::Text)
                    .starts_with(["Use of water"])
                    .with_multiple(Multiple::MultipleLabelsMultipleValues),
            ],
        );
        let (results, _) = run(&[group], &["Purpose: spray irrigation", "Use of water: general agriculture"]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].value(), "general agriculture");
    }

    #[test]
    fn test_multiple_lines_merge_into_one_value() {
        let group = LabelGroup::new(
            "Conditions",
            [LabelToMatch::new("Conditions", Position::LabelIsBeforeTextToFind, Format::Text)
                .starts_with(["Condition"])
                .with_multiple(Multiple::SingleLabelSingleValueMultipleLines)],
        );
        let (results, _) = run(
            &[group],
            &["Condition: abstraction only in daylight", "Condition: meter to be fitted"],
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text.len(), 2);
        assert_eq!(results[0].value(), "abstraction only in daylight meter to be fitted");
    }

    #[test]
    fn test_too_few_sub_matches_invalidates_branch() {
        let label = LabelToMatch::new("Block", Position::TextToFindIsBetweenLabels, Format::Text)
            .starts_with(["START"])
            .ends_with([END_OF_BLOCK])
            .with_minimum_sub_matches(1)
            .with_sub_label(
                LabelToMatch::new("Missing", Position::LabelIsBeforeTextToFind, Format::Text)
                    .starts_with(["nowhere to be found"]),
            );
        let (results, state) = run(&[LabelGroup::new("Block", [label])], &["START", "payload"]);
        assert!(results.is_empty());
        assert!(!state.is_group_matched("Block"));
    }

    #[test]
    fn test_block_start_sub_matches_are_dropped_unless_alone() {
        let header = LabelToMatch::new("Header", Position::ApplicableToAll, Format::Text)
            .starts_with([START_OF_BLOCK]);
        let purpose = LabelToMatch::new("Purpose", Position::LabelIsBeforeTextToFind, Format::Text)
            .starts_with(["Purpose"]);
        let block = |subs: Vec<LabelToMatch>| {
            let mut label = LabelToMatch::new("Block", Position::TextToFindIsBetweenLabels, Format::Text)
                .starts_with(["START"])
                .ends_with([END_OF_BLOCK]);
            for sub in subs {
                label = label.with_sub_label(sub);
            }
            vec![LabelGroup::new("Block", [label])]
        };
        let rows = ["START", "Header text here", "Purpose: spray irrigation"];

        let (results, _) = run(&block(vec![header.clone(), purpose]), &rows);
        let names: Vec<&str> = results[0]
            .sub_results
            .iter()
            .map(|s| s.label_group_name.as_str())
            .collect();
        assert_eq!(names, vec!["Purpose"]);

        let (results, _) = run(&block(vec![header]), &rows);
        assert_eq!(results[0].sub_results[0].value(), "Header text here");
    }

    #[test]
    fn test_succession_short_circuits_remaining_groups() {
        let groups = vec![
            LabelGroup::new(
                "Succession",
                [LabelToMatch::new("Succession", Position::ContractIsSuccession, Format::Text)
                    .starts_with(["transfer", "succession"])
                    .with_window(0, 1)],
            ),
            LabelGroup::new(
                "Company",
                [LabelToMatch::new("Company", Position::LabelIsBeforeTextToFind, Format::CompanyName)
                    .starts_with(["Licence holder"])],
            ),
        ];
        let (results, state) = run(&groups, &["Notice of transfer", "by succession", "Licence holder: Acme Ltd"]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_type, MatchType::Succession);
        assert!(state.is_succession());
    }

    #[test]
    fn test_matched_groups_are_skipped_on_later_passes() {
        let lexicon = Lexicon::new();
        let groups = vec![licence_group(Multiple::None)];
        let mut state = MatchState::new();
        let matcher = Matcher::new(&lexicon);

        let first = matcher
            .match_groups(&groups, &lines(&["Licence No 1/2/3"]), &[], &mut state, &mut NoLinks)
            .unwrap();
        let second = Matcher::for_ocr(&lexicon, "local")
            .match_groups(&groups, &lines(&["Licence No 4/5/6"]), &first, &mut state, &mut NoLinks)
            .unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_ocr_results_carry_service_name() {
        let lexicon = Lexicon::new();
        let mut state = MatchState::new();
        let results = Matcher::for_ocr(&lexicon, "local")
            .match_groups(
                &[licence_group(Multiple::None)],
                &lines(&["Licence No 1/2/3"]),
                &[],
                &mut state,
                &mut NoLinks,
            )
            .unwrap();
        assert!(results[0].is_ocr);
        assert_eq!(results[0].service_name.as_deref(), Some("local"));
    }

    struct TableResolver {
        table: HashMap<String, Vec<LabelGroupResult>>,
    }

    impl LinkResolver for TableResolver {
        fn resolve(&mut self, licence_number: &str, label: &LabelToMatch) -> Result<LinkOutcome> {
            Ok(match self.table.get(licence_number) {
                Some(matches) => LinkOutcome::Linked(matches.clone()),
                None => LinkOutcome::Skipped(Some(ExtractionWarning::MissingLicenceMapping {
                    licence_number: licence_number.to_string(),
                    label: label.name.clone(),
                })),
            })
        }
    }

    #[test]
    fn test_linked_licences_resolve_and_warn_on_missing_mapping() {
        let groups = vec![
            LabelGroup::new(
                "LinkedNumbers",
                [LabelToMatch::new("LinkedNumbers", Position::LabelIsBeforeTextToFind, Format::LicenceNumber)
                    .starts_with(["Linked to licence"])
                    .with_multiple(Multiple::SingleLabelMultipleValues)
                    .removing(RemoveRule::literal("No."))],
            ),
            LabelGroup::new(
                "Linked",
                [LabelToMatch::new("Linked", Position::ApplicableToAll, Format::LinkedLicence)
                    .related_to(None, "LinkedNumbers")
                    .with_multiple(Multiple::SingleLabelMultipleValues)],
            ),
        ];
        let linked_doc = run(&[licence_group(Multiple::None)], &["Licence No 9/9/9"]).0;
        let mut resolver = TableResolver {
            table: HashMap::from([("1/2/3".to_string(), linked_doc)]),
        };

        let lexicon = Lexicon::new();
        let mut state = MatchState::new();
        let results = Matcher::new(&lexicon)
            .match_groups(
                &groups,
                &lines(&["Linked to licence No. 1/2/3 and 4/5/6"]),
                &[],
                &mut state,
                &mut resolver,
            )
            .unwrap();

        let linked: Vec<&LabelGroupResult> = results.iter().filter(|r| r.label_group_name == "Linked").collect();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].match_type, MatchType::LinkedLicence);
        assert_eq!(linked[0].value(), "1/2/3");
        assert_eq!(linked[0].depth(), 1);
        assert_eq!(
            state.warnings(),
            &[ExtractionWarning::MissingLicenceMapping {
                licence_number: "4/5/6".to_string(),
                label: "Linked".to_string(),
            }]
        );
    }
}
