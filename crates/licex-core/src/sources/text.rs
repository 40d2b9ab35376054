//! Plain-text line source. Form feeds separate pages.

use std::path::Path;

use tracing::debug;

use super::{has_extension, LineSource, SourceDocument};
use crate::error::Result;
use crate::models::document::{lines_from_text, renumber};

#[derive(Debug, Clone, Copy, Default)]
pub struct TextLineSource;

impl TextLineSource {
    /// Lines of already loaded text.
    pub fn parse(text: &str) -> SourceDocument {
        let pages: Vec<&str> = text.split('\x0c').collect();
        let lines = pages
            .iter()
            .enumerate()
            .flat_map(|(idx, page)| lines_from_text(page.lines(), idx as u32 + 1))
            .collect();

        SourceDocument {
            lines: renumber(lines),
            number_of_pages: pages.len() as u32,
            image_regions: Vec::new(),
        }
    }
}

impl LineSource for TextLineSource {
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["txt"])
    }

    fn read(&self, path: &Path) -> Result<SourceDocument> {
        let text = std::fs::read_to_string(path)?;
        let document = Self::parse(&text);
        debug!("Read {}: {} lines", path.display(), document.lines.len());
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pages_and_numbering() {
        let document = TextLineSource::parse("Licence  No 1/2/3\n\nHolder\x0cPage two");
        assert_eq!(document.number_of_pages, 2);
        let lines: Vec<(usize, u32, &str)> = document
            .lines
            .iter()
            .map(|l| (l.line_number, l.page_number, l.text.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![(0, 1, "Licence No 1/2/3"), (1, 1, "Holder"), (2, 2, "Page two")]
        );
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("licence.txt");
        std::fs::write(&path, "Licence holder: Acme Ltd\n").unwrap();

        let source = TextLineSource;
        assert!(source.supports(&path));
        assert!(!source.supports(Path::new("licence.pdf")));
        assert_eq!(source.read(&path).unwrap().lines[0].text, "Licence holder: Acme Ltd");
    }
}
