//! Deterministic text heuristics shared by the matching strategies.

pub mod autocorrect;
pub mod corruption;
pub mod exclusion;
pub mod lexicon;
pub mod names;
pub mod patterns;
pub mod values;

pub use autocorrect::{autocorrect_line, autocorrect_text};
pub use corruption::is_corrupted;
pub use exclusion::{apply_removals, apply_removals_to_line, Exclusion};
pub use lexicon::{Lexicon, SpellChecker, WordList};
pub use names::{is_name, recognise_name};
pub use values::{
    find_licence_numbers, find_number, first_word, is_date_or_purpose,
    is_licence_number, match_units, parse_number,
};
