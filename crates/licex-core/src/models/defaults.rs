//! Built-in label specification for water abstraction licences.

use super::label::{
    Format, LabelGroup, LabelSpec, LabelToMatch, Multiple, Position, RemoveRule, END_OF_BLOCK,
};

const VOLUME_UNITS: [&str; 6] = [
    "cubic metres",
    "megalitres",
    "litres",
    "million gallons",
    "gallons",
    "m3",
];

/// The specification used when no label file is configured.
pub fn default_label_spec() -> LabelSpec {
    LabelSpec::new(vec![
        succession(),
        licence_number(),
        licence_holder(),
        abstraction_point(),
        purpose(),
        abstraction_limit_point(),
        linked_licence_numbers(),
        linked_licence(),
    ])
}

fn succession() -> LabelGroup {
    LabelGroup::new(
        "Succession",
        [LabelToMatch::new("Succession", Position::ContractIsSuccession, Format::Text)
            .starts_with(["transfer", "succession"])
            .with_window(0, 2)],
    )
}

fn licence_number() -> LabelGroup {
    LabelGroup::new(
        "LicenceNumber",
        [
            LabelToMatch::new(
                "LicenceNumber",
                Position::LabelIsBeforeAndOrAfterTextToFindPreferLabelToBeBefore,
                Format::LicenceNumber,
            )
            .starts_with(["Licence serial no", "Licence serial number", "Licence number", "Licence No", "Serial No"])
            .removing(RemoveRule::literal("No."))
            .removing(RemoveRule::literal("number"))
            .with_window(1, 2),
            LabelToMatch::new("LicenceNumber", Position::ApplicableToAll, Format::LicenceNumber)
                .starts_with(["Licence"]),
        ],
    )
}

fn licence_holder() -> LabelGroup {
    LabelGroup::new(
        "LicenceHolder",
        [
            LabelToMatch::new(
                "LicenceHolder",
                Position::LabelIsBeforeAndOrAfterTextToFindPreferLabelToBeBefore,
                Format::CompanyName,
            )
            .starts_with(["Name of licence holder", "Licence holder", "Granted to", "Issued to"])
            .removing(RemoveRule::regex(r"(?i)\(the licence holder\)"))
            .removing(RemoveRule::regex(r"(?i)name\s*:?").at_line_start())
            .with_window(2, 3),
            LabelToMatch::new("LicenceHolder", Position::LabelIsAfterTextToFind, Format::CompanyName)
                .starts_with(["(the Licence Holder)", "hereinafter called the licence holder"])
                .with_window(3, 0),
        ],
    )
}

fn abstraction_point() -> LabelGroup {
    LabelGroup::new(
        "AbstractionPoint",
        [LabelToMatch::new("AbstractionPoint", Position::TextToFindIsBetweenLabels, Format::Text)
            .starts_with(["Points of abstraction", "Point of abstraction", "Source of supply"])
            .ends_with(["Means of abstraction", "Purpose of abstraction", END_OF_BLOCK])
            .with_window(0, 4)
            .with_multiple(Multiple::SingleLabelMultipleValues)
            .with_sub_label(
                LabelToMatch::new("PointAlternative", Position::Split, Format::Text)
                    .starts_with([" or "])
                    .with_window(0, 1),
            )
            .with_sub_label(
                LabelToMatch::new("GridReference", Position::LabelIsBeforeTextToFind, Format::Text)
                    .starts_with(["National Grid Reference", "NGR"])
                    .removing(RemoveRule::regex(r"[:\-]\s*").at_line_start()),
            )],
    )
}

fn purpose() -> LabelGroup {
    LabelGroup::new(
        "Purpose",
        [
            LabelToMatch::new("Purpose", Position::LabelIsBeforeTextToFind, Format::Text)
                .starts_with(["Purpose of abstraction", "Purposes of abstraction"])
                .with_window(0, 2)
                .with_multiple(Multiple::MultipleLabelsMultipleValues),
            LabelToMatch::new("Purpose", Position::LabelIsBeforeTextToFind, Format::Text)
                .starts_with(["Use of water"])
                .with_window(0, 1)
                .with_multiple(Multiple::MultipleLabelsMultipleValues),
        ],
    )
}

fn volume_pair(period: &str, phrase: &str) -> [LabelToMatch; 2] {
    let category = format!("Per{}", period);
    let units = format!("{}Units", category);
    [
        LabelToMatch::new(units.clone(), Position::LabelIsAfterTextToFind, Format::Units)
            .starts_with([phrase])
            .with_possibilities(VOLUME_UNITS)
            .in_category(category.clone()),
        LabelToMatch::new(format!("{}Value", category), Position::RelatedCategoryPosition, Format::Number)
            .related_to(Some(category.as_str()), units)
            .with_window(1, 1),
    ]
}

fn abstraction_limit_point() -> LabelGroup {
    let mut label = LabelToMatch::new("AbstractionLimitPoint", Position::TextToFindIsBetweenLabels, Format::Text)
        .starts_with(["Maximum quantity of water", "Maximum quantities"])
        .ends_with(["Period of abstraction", "Means of measurement", END_OF_BLOCK])
        .with_window(0, 6)
        .with_minimum_sub_matches(2)
        .with_multiple(Multiple::SingleLabelMultipleValues)
        .including_label_text()
        .with_sub_label(
            LabelToMatch::new("PointPurpose", Position::LabelIsBeforeTextToFind, Format::DateOrPurpose)
                .starts_with(["Up to and including", "In aggregate"])
                .including_label_text(),
        );
    for (period, phrase) in [("Hour", "per hour"), ("Day", "per day"), ("Year", "per year")] {
        for sub in volume_pair(period, phrase) {
            label = label.with_sub_label(sub);
        }
    }
    LabelGroup::new("AbstractionLimitPoint", [label])
}

fn linked_licence_numbers() -> LabelGroup {
    LabelGroup::new(
        "LinkedLicenceNumbers",
        [LabelToMatch::new("LinkedLicenceNumbers", Position::LabelIsBeforeTextToFind, Format::LicenceNumber)
            .starts_with(["in conjunction with licence", "linked to licence", "see also licence"])
            .removing(RemoveRule::literal("No."))
            .removing(RemoveRule::literal("numbers"))
            .with_window(0, 1)
            .with_multiple(Multiple::SingleLabelMultipleValues)],
    )
}

fn linked_licence() -> LabelGroup {
    LabelGroup::new(
        "LinkedLicence",
        [LabelToMatch::new("LinkedLicence", Position::ApplicableToAll, Format::LinkedLicence)
            .related_to(None, "LinkedLicenceNumbers")
            .with_multiple(Multiple::SingleLabelMultipleValues)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_spec_is_valid() {
        let spec = default_label_spec();
        spec.validate().unwrap();
        let names: Vec<&str> = spec.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names[0], "Succession");
        assert!(names.contains(&"LinkedLicence"));
    }

    #[test]
    fn test_default_spec_survives_json() {
        let spec = default_label_spec();
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(LabelSpec::from_json(&json).unwrap(), spec);
    }

    #[test]
    fn test_value_labels_follow_their_units() {
        let spec = default_label_spec();
        let limit = &spec.group("AbstractionLimitPoint").unwrap().labels[0];
        let names: Vec<&str> = limit.sub_labels.iter().map(|l| l.name.as_str()).collect();
        let units = names.iter().position(|n| *n == "PerDayUnits").unwrap();
        let value = names.iter().position(|n| *n == "PerDayValue").unwrap();
        assert!(units < value);
    }
}
