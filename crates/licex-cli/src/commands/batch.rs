//! Batch processing command for many documents.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use licex_core::{DocumentExtractor, DocumentResult, ExtractorPool};

use super::process::ExtractionOverrides;

/// Summary file written next to the per-document results.
const SUMMARY_FILE: &str = "batch-summary.json";

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input documents
    #[arg(required = true)]
    input: String,

    /// Output directory for one JSON file per document (default: JSON lines on stdout)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of pooled extractors (default: extraction.pool_size)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Exit successfully even when some documents failed
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    overrides: ExtractionOverrides,
}

/// Outcome of one document.
struct ProcessResult {
    path: PathBuf,
    output: PathBuf,
    result: Result<DocumentResult, String>,
    processing_time_ms: u64,
}

/// One row of the batch summary; failures carry the error instead of an output.
#[derive(Serialize)]
struct SummaryEntry<'a> {
    input: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    processing_time_ms: u64,
}

impl<'a> SummaryEntry<'a> {
    fn new(outcome: &'a ProcessResult, output_dir: Option<&Path>) -> Self {
        let (output, error) = match &outcome.result {
            Ok(_) => (output_dir.map(|_| outcome.output.as_path()), None),
            Err(e) => (None, Some(e.as_str())),
        };
        Self {
            input: &outcome.path,
            output,
            error,
            processing_time_ms: outcome.processing_time_ms,
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = args.overrides.apply(super::load_config(config_path)?);

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }
    let outputs = output_names(&files, &glob_root(&args.input));

    let size = args.jobs.unwrap_or(config.extraction.pool_size).clamp(1, files.len());
    let pool = Arc::new(ExtractorPool::build(size, || DocumentExtractor::from_config(config.clone()))?);
    debug!("Extractor pool of {}", pool.size());

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let handles: Vec<_> = files
        .into_iter()
        .zip(outputs)
        .map(|(path, output)| {
            let pool = Arc::clone(&pool);
            tokio::task::spawn_blocking(move || {
                let file_start = Instant::now();
                let lease = pool.lease_blocking();
                let result = lease.extract(&path).map_err(|e| e.to_string());
                drop(lease);
                ProcessResult {
                    path,
                    output,
                    result,
                    processing_time_ms: file_start.elapsed().as_millis() as u64,
                }
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle.await?;
        if let Err(e) = &outcome.result {
            warn!("Failed to process {}: {}", outcome.path.display(), e);
        }
        progress.inc(1);
        results.push(outcome);
    }
    progress.finish_and_clear();

    for outcome in &results {
        match (&args.output_dir, &outcome.result) {
            (Some(output_dir), Ok(result)) => {
                let output_path = output_dir.join(&outcome.output);
                if let Some(parent) = output_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&output_path, serde_json::to_string_pretty(result)?)?;
                debug!(
                    "Wrote {} ({}ms)",
                    output_path.display(),
                    outcome.processing_time_ms
                );
            }
            (Some(_), Err(_)) => {}
            (None, Ok(result)) => println!("{}", serde_json::to_string(result)?),
            (None, Err(_)) => println!("{}", serde_json::to_string(&SummaryEntry::new(outcome, None))?),
        }
    }

    if let Some(output_dir) = &args.output_dir {
        let summary: Vec<SummaryEntry> = results
            .iter()
            .map(|outcome| SummaryEntry::new(outcome, Some(output_dir)))
            .collect();
        fs::write(output_dir.join(SUMMARY_FILE), serde_json::to_string_pretty(&summary)?)?;
    }

    let failed: Vec<&ProcessResult> = results.iter().filter(|r| r.result.is_err()).collect();
    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for outcome in &failed {
            if let Err(e) = &outcome.result {
                eprintln!("  - {}: {}", outcome.path.display(), e);
            }
        }
        if !args.continue_on_error {
            anyhow::bail!("{} of {} documents failed", failed.len(), results.len());
        }
    }

    Ok(())
}

/// Directory part of a glob pattern before its first wildcard component.
fn glob_root(pattern: &str) -> PathBuf {
    let path = Path::new(pattern);
    let literal: PathBuf = path
        .components()
        .take_while(|c| {
            let part = c.as_os_str().to_string_lossy();
            !part.contains(['*', '?', '[', '{'])
        })
        .collect();
    if literal == path {
        literal.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        literal
    }
}

/// Output paths relative to the output directory, mirroring each input's
/// place under `root`.
///
/// `x.pdf` and `x.txt` in one directory would both map to `x.json`; the later
/// one keeps its extension (`x.txt.json`), then gains a counter.
fn output_names(files: &[PathBuf], root: &Path) -> Vec<PathBuf> {
    let mut taken: HashSet<PathBuf> = HashSet::new();
    files
        .iter()
        .map(|file| {
            let relative = file.strip_prefix(root).unwrap_or(file);
            let dir: PathBuf = relative
                .parent()
                .map(|p| p.components().filter(|c| matches!(c, Component::Normal(_))).collect())
                .unwrap_or_default();
            let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("licence");
            let ext = file.extension().and_then(|s| s.to_str()).unwrap_or("");

            let mut name = dir.join(format!("{}.json", stem));
            if taken.contains(&name) {
                name = dir.join(format!("{}.{}.json", stem, ext));
            }
            let mut counter = 2;
            while taken.contains(&name) {
                name = dir.join(format!("{}.{}-{}.json", stem, ext, counter));
                counter += 1;
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}
