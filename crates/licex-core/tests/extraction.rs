//! End-to-end extraction of plain-text licences with the built-in label specification.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use licex_core::sources::JsonLicenceLookup;
use licex_core::{
    default_label_spec, DocumentExtractor, ExtractionWarning, ExtractorPool, Format, LabelError, LabelGroup,
    LabelSpec, LabelToMatch, Lexicon, LicexConfig, LicexError, MatchType, Position,
};
use pretty_assertions::assert_eq;

const LICENCE: &str = "\
WATER RESOURCES ACT 1991
Licence to abstract water
Licence serial no 25/68/001/247
Licence holder: Severn Valley Water Ltd
Points of abstraction
Borehole at Upper Farm or the River Severn at Lower Weir
Means of abstraction
Purpose of abstraction: Spray irrigation
Maximum quantities
Up to and including 31 March 2025
215 cubic metres per hour
4550 cubic metres per day
Period of abstraction
In conjunction with licence 25/68/001/248
";

fn extractor() -> DocumentExtractor {
    let mut config = LicexConfig::default();
    config.ocr.enabled = false;
    DocumentExtractor::new(Arc::new(default_label_spec()), Arc::new(Lexicon::new()), config).unwrap()
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_builtin_spec_over_text_licence() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "licence.txt", LICENCE);

    let result = extractor().extract(&path).unwrap();

    assert_eq!(result.filename, "licence.txt");
    assert_eq!(result.number_of_pages, 1);
    assert!(!result.scanned_file);
    assert_eq!(result.find_value("LicenceNumber"), Some("25/68/001/247".to_string()));
    assert_eq!(result.find_value("LicenceHolder"), Some("Severn Valley Water Ltd".to_string()));
    assert_eq!(result.find_value("Purpose"), Some("Spray irrigation".to_string()));
    assert_eq!(
        result.find_value("LinkedLicenceNumbers"),
        Some("25/68/001/248".to_string())
    );
    // no lookup configured, so the link is not followed
    assert!(result.group("LinkedLicence").is_empty());
    assert!(result.warnings.is_empty());

    let limits = result.group("AbstractionLimitPoint");
    assert_eq!(limits.len(), 1);
    let limit = limits[0];
    assert_eq!(limit.match_type, MatchType::Between);
    assert_eq!(limit.sub_result("PerHourValue").map(|r| r.value()), Some("215".to_string()));
    assert_eq!(
        limit.sub_result("PerHourUnits").map(|r| r.value()),
        Some("cubic metres".to_string())
    );
    assert_eq!(limit.sub_result("PerDayValue").map(|r| r.value()), Some("4550".to_string()));
    assert_eq!(
        limit.sub_result("PointPurpose").map(|r| r.value()),
        Some("Up to and including 31 March 2025".to_string())
    );
    assert!(limit.sub_result("PerYearValue").is_none());
}

#[test]
fn test_abstraction_point_alternatives_are_split() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "licence.txt", LICENCE);

    let result = extractor().extract(&path).unwrap();
    let points = result.group("AbstractionPoint");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].value(), "Borehole at Upper Farm or the River Severn at Lower Weir");

    let split = points[0].sub_result("PointAlternative").unwrap();
    assert_eq!(split.match_type, MatchType::Split);
    let spans: Vec<String> = split.sub_results.iter().map(|s| s.value()).collect();
    assert_eq!(
        spans,
        vec!["Borehole at Upper Farm".to_string(), "the River Severn at Lower Weir".to_string()]
    );
}

#[test]
fn test_reciprocal_licences_terminate() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(
        dir.path(),
        "a.txt",
        "Licence serial no 25/68/001/247\nIn conjunction with licence 25/68/001/248\n",
    );
    write(
        dir.path(),
        "b.txt",
        "Licence serial no 25/68/001/248\nIn conjunction with licence 25/68/001/247\n",
    );
    let lookup = JsonLicenceLookup::new(HashMap::from([
        ("25/68/001/247".to_string(), dir.path().join("a.txt")),
        ("25/68/001/248".to_string(), dir.path().join("b.txt")),
    ]));

    let result = extractor().with_lookup(Arc::new(lookup)).extract(&a).unwrap();

    let linked = result.group("LinkedLicence");
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].match_type, MatchType::LinkedLicence);
    assert_eq!(linked[0].depth(), 1);
    assert_eq!(
        linked[0].sub_result("LicenceNumber").map(|r| r.value()),
        Some("25/68/001/248".to_string())
    );
    assert!(linked[0].sub_result("LinkedLicence").is_none());
    assert!(result
        .warnings
        .iter()
        .any(|w| matches!(w, ExtractionWarning::LinkCycleSkipped { .. })));
}

#[test]
fn test_missing_mapping_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "licence.txt", LICENCE);
    let lookup = JsonLicenceLookup::new(HashMap::new());

    let result = extractor().with_lookup(Arc::new(lookup)).extract(&path).unwrap();

    assert!(result.group("LinkedLicence").is_empty());
    assert_eq!(
        result.warnings,
        vec![ExtractionWarning::MissingLicenceMapping {
            licence_number: "25/68/001/248".to_string(),
            label: "LinkedLicence".to_string(),
        }]
    );
}

#[test]
fn test_pool_serves_concurrent_documents() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..6)
        .map(|i| write(dir.path(), &format!("licence-{}.txt", i), LICENCE))
        .collect();

    let pool = Arc::new(ExtractorPool::build(2, || Ok(extractor())).unwrap());
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || pool.lease_blocking().extract(&path).unwrap())
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result.find_value("LicenceNumber"), Some("25/68/001/247".to_string()));
    }
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn test_serialized_result_omits_sub_labels() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "licence.txt", LICENCE);

    let result = extractor().extract(&path).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"AbstractionLimitPoint\""));
    assert!(!json.contains("sub_labels"));
}

#[test]
fn test_builder_spec_with_unanchored_split_aborts() {
    let spec = LabelSpec::new(vec![LabelGroup::new(
        "AbstractionPoint",
        [LabelToMatch::new("AbstractionPoint", Position::Split, Format::Text)],
    )]);

    let result = DocumentExtractor::new(Arc::new(spec), Arc::new(Lexicon::new()), LicexConfig::default());

    assert!(matches!(
        result,
        Err(LicexError::Label(LabelError::SplitWithoutText(_)))
    ));
}
