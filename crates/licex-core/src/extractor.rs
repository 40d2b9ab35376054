//! Whole-document extraction: direct text first, OCR fallback for unmatched
//! groups, and linked-licence following across documents.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{LicexError, Result};
use crate::matching::{LinkOutcome, LinkResolver, MatchState, Matcher};
use crate::models::config::LicexConfig;
use crate::models::defaults::default_label_spec;
use crate::models::document::{renumber, DocumentLine};
use crate::models::label::{LabelSpec, LabelToMatch};
use crate::models::result::{DocumentResult, ExtractionWarning, LabelGroupResult};
use crate::sources::{
    JsonLicenceLookup, LicenceLookup, LineSource, OcrProvider, PdfLineSource, SourceDocument, TextLineSource,
};
use crate::text::autocorrect::autocorrect_line;
use crate::text::lexicon::Lexicon;

/// Documents already extracted in one run, and the current link depth.
#[derive(Debug, Clone, Default)]
pub struct LinkTrail {
    visited: HashSet<PathBuf>,
    depth: usize,
}

impl LinkTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_visited(&self, path: &Path) -> bool {
        self.visited.contains(&canonical(path))
    }

    /// Record a document; false when it was already visited.
    pub fn visit(&mut self, path: &Path) -> bool {
        self.visited.insert(canonical(path))
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Extracts label matches from documents.
///
/// One instance serves one document at a time; see
/// [`ExtractorPool`](crate::pool::ExtractorPool) for concurrent use.
pub struct DocumentExtractor {
    spec: Arc<LabelSpec>,
    lexicon: Arc<Lexicon>,
    sources: Vec<Box<dyn LineSource>>,
    providers: Vec<Box<dyn OcrProvider>>,
    lookup: Option<Arc<dyn LicenceLookup>>,
    config: LicexConfig,
}

impl DocumentExtractor {
    /// Extractor with the PDF and plain-text line sources and no OCR providers.
    ///
    /// Fails with [`LicexError::Label`] when the label specification is invalid.
    pub fn new(spec: Arc<LabelSpec>, lexicon: Arc<Lexicon>, config: LicexConfig) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            lexicon,
            sources: vec![
                Box::new(PdfLineSource::new(config.pdf.clone())),
                Box::new(TextLineSource),
            ],
            providers: Vec::new(),
            lookup: None,
            config,
        })
    }

    /// Build everything the configuration names: label specification,
    /// lexicon, licence lookup and the local OCR provider.
    pub fn from_config(config: LicexConfig) -> Result<Self> {
        let spec = match &config.extraction.labels {
            Some(path) => LabelSpec::from_file(path)?,
            None => default_label_spec(),
        };
        let lexicon = Lexicon::from_config(&config.lexicon)?;
        let lookup = config
            .extraction
            .licence_lookup
            .as_deref()
            .map(JsonLicenceLookup::from_file)
            .transpose()?;

        let mut extractor = Self::new(Arc::new(spec), Arc::new(lexicon), config)?;
        if let Some(lookup) = lookup {
            extractor = extractor.with_lookup(Arc::new(lookup));
        }

        #[cfg(feature = "native")]
        {
            let ocr = extractor.config.ocr.clone();
            if ocr.enabled && ocr.model_dir.is_dir() {
                let provider = crate::sources::LocalOcrProvider::from_dir(&ocr.model_dir, ocr.clone())?;
                extractor = extractor.with_provider(Box::new(provider));
            } else if ocr.enabled {
                warn!("OCR model directory {} not found, OCR fallback disabled", ocr.model_dir.display());
            }
        }

        Ok(extractor)
    }

    /// Line sources are consulted in insertion order; added sources win.
    pub fn with_source(mut self, source: Box<dyn LineSource>) -> Self {
        self.sources.insert(0, source);
        self
    }

    /// Providers are tried in ascending cost, insertion order within a cost.
    pub fn with_provider(mut self, provider: Box<dyn OcrProvider>) -> Self {
        self.providers.push(provider);
        self.providers.sort_by_key(|p| p.cost());
        self
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn LicenceLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn spec(&self) -> &LabelSpec {
        &self.spec
    }

    pub fn config(&self) -> &LicexConfig {
        &self.config
    }

    /// Provider names in trial order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Extract one document.
    pub fn extract(&self, path: &Path) -> Result<DocumentResult> {
        self.extract_with_trail(path, &mut LinkTrail::new())
    }

    /// Extract one document as part of a linked-licence traversal.
    pub fn extract_with_trail(&self, path: &Path, trail: &mut LinkTrail) -> Result<DocumentResult> {
        let start = Instant::now();
        trail.visit(path);

        let source = self
            .sources
            .iter()
            .find(|s| s.supports(path))
            .ok_or_else(|| LicexError::UnsupportedDocument(path.to_path_buf()))?;
        let document = source.read(path)?;

        let mut state = MatchState::new();
        let mut follower = LinkFollower {
            extractor: self,
            trail,
            nested_warnings: Vec::new(),
        };

        let mut matches = Matcher::new(&self.lexicon).match_groups(
            &self.spec.groups,
            &document.lines,
            &[],
            &mut state,
            &mut follower,
        )?;
        debug!(
            "{}: {} direct match(es) from {} line(s)",
            path.display(),
            matches.len(),
            document.lines.len()
        );

        let services_used = self.ocr_fallback(&document, &mut matches, &mut state, &mut follower)?;

        let mut warnings = state.take_warnings();
        for warning in follower.nested_warnings {
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }

        let result = DocumentResult {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            matches,
            number_of_pages: document.number_of_pages,
            scanned_file: document.text_len() < self.config.pdf.min_text_length
                && !document.image_regions.is_empty(),
            services_used,
            warnings,
        };

        info!(
            "Extracted {}: {} match(es), {} warning(s) in {}ms",
            result.filename,
            result.matches.len(),
            result.warnings.len(),
            start.elapsed().as_millis()
        );
        Ok(result)
    }

    fn has_unmatched_groups(&self, state: &MatchState) -> bool {
        !state.is_succession() && self.spec.groups.iter().any(|g| !state.is_group_matched(&g.name))
    }

    /// Run providers in cost order over the image regions while groups stay unmatched.
    ///
    /// Lines of providers that resolve nothing are kept and tried again
    /// together with the next provider's lines.
    fn ocr_fallback(
        &self,
        document: &SourceDocument,
        matches: &mut Vec<LabelGroupResult>,
        state: &mut MatchState,
        links: &mut dyn LinkResolver,
    ) -> Result<Vec<String>> {
        let mut services_used = Vec::new();
        if !self.config.ocr.enabled || document.image_regions.is_empty() {
            return Ok(services_used);
        }

        let mut merged: Vec<DocumentLine> = Vec::new();
        let mut contributors: Vec<&str> = Vec::new();

        for provider in &self.providers {
            if !self.has_unmatched_groups(state) {
                break;
            }
            let lines = self.recognise(provider.as_ref(), document)?;
            services_used.push(provider.name().to_string());
            if lines.is_empty() {
                continue;
            }

            let mut found = Matcher::for_ocr(&self.lexicon, provider.name()).match_groups(
                &self.spec.groups,
                &lines,
                matches.as_slice(),
                state,
                links,
            )?;

            if found.is_empty() && !merged.is_empty() {
                let combined: Vec<DocumentLine> = merged.iter().chain(lines.iter()).cloned().collect();
                let name = contributors
                    .iter()
                    .copied()
                    .chain(std::iter::once(provider.name()))
                    .collect::<Vec<_>>()
                    .join("+");
                debug!("Trying merged fallback lines from {}", name);
                found = Matcher::for_ocr(&self.lexicon, name).match_groups(
                    &self.spec.groups,
                    &renumber(combined),
                    matches.as_slice(),
                    state,
                    links,
                )?;
            }

            if found.is_empty() {
                merged.extend(lines);
                contributors.push(provider.name());
            } else {
                debug!("{} resolved {} match(es)", provider.name(), found.len());
                matches.extend(found);
            }
        }

        Ok(services_used)
    }

    fn recognise(&self, provider: &dyn OcrProvider, document: &SourceDocument) -> Result<Vec<DocumentLine>> {
        let mut lines = Vec::new();
        for region in &document.image_regions {
            let recognised = provider.recognise(region)?;
            debug!(
                "{} recognised {} line(s) in {}",
                provider.name(),
                recognised.len(),
                region.cache_key()
            );
            lines.extend(recognised);
        }

        if self.config.extraction.auto_correct {
            lines = lines.iter().map(|l| autocorrect_line(l, &self.lexicon)).collect();
        }
        Ok(renumber(lines))
    }
}

/// Resolves linked licence numbers by extracting the target documents inline.
struct LinkFollower<'e, 't> {
    extractor: &'e DocumentExtractor,
    trail: &'t mut LinkTrail,
    nested_warnings: Vec<ExtractionWarning>,
}

impl LinkResolver for LinkFollower<'_, '_> {
    fn resolve(&mut self, licence_number: &str, label: &LabelToMatch) -> Result<LinkOutcome> {
        let Some(lookup) = &self.extractor.lookup else {
            debug!("No licence lookup configured, not following {}", licence_number);
            return Ok(LinkOutcome::Skipped(None));
        };
        let Some(path) = lookup.path_for(licence_number) else {
            warn!("No document mapped for linked licence {}", licence_number);
            return Ok(LinkOutcome::Skipped(Some(ExtractionWarning::MissingLicenceMapping {
                licence_number: licence_number.to_string(),
                label: label.name.clone(),
            })));
        };

        if self.trail.has_visited(&path) {
            warn!("Linked document {} already extracted, skipping", path.display());
            return Ok(LinkOutcome::Skipped(Some(ExtractionWarning::LinkCycleSkipped { path })));
        }
        let max_depth = self.extractor.config.extraction.max_link_depth;
        if self.trail.depth >= max_depth {
            warn!("Link depth {} reached at {}", max_depth, path.display());
            return Ok(LinkOutcome::Skipped(Some(ExtractionWarning::LinkDepthExceeded {
                path,
                depth: self.trail.depth,
            })));
        }

        debug!("Following linked licence {} to {}", licence_number, path.display());
        self.trail.depth += 1;
        let linked = self.extractor.extract_with_trail(&path, self.trail);
        self.trail.depth -= 1;

        let linked = linked?;
        self.nested_warnings.extend(linked.warnings);
        Ok(LinkOutcome::Linked(linked.matches))
    }
}
