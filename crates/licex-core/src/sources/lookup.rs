//! Licence number to document path table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::LicenceLookup;
use crate::error::Result;
use crate::text::values::is_licence_number;

/// Lookup backed by a JSON object of licence number to path.
///
/// Relative paths resolve against the directory of the table file.
#[derive(Debug, Clone, Default)]
pub struct JsonLicenceLookup {
    paths: HashMap<String, PathBuf>,
}

impl JsonLicenceLookup {
    pub fn new(paths: HashMap<String, PathBuf>) -> Self {
        let paths = paths
            .into_iter()
            .map(|(number, path)| (normalise(&number), path))
            .collect();
        Self { paths }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table: HashMap<String, PathBuf> = serde_json::from_str(&content)?;
        let base = path.parent().unwrap_or(Path::new(""));

        let skipped = table.keys().filter(|k| !is_licence_number(k)).count();
        if skipped > 0 {
            debug!("{} lookup key(s) do not look like licence numbers", skipped);
        }

        Ok(Self::new(
            table
                .into_iter()
                .map(|(number, p)| {
                    let p = if p.is_relative() { base.join(p) } else { p };
                    (number, p)
                })
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl LicenceLookup for JsonLicenceLookup {
    fn path_for(&self, licence_number: &str) -> Option<PathBuf> {
        self.paths.get(&normalise(licence_number)).cloned()
    }
}

fn normalise(number: &str) -> String {
    number.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}
