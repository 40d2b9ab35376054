//! Process command - extract matches from a single document.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::info;

use licex_core::{DocumentExtractor, DocumentResult, LabelGroupResult, LicexConfig};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input document (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    overrides: ExtractionOverrides,
}

/// Command-line overrides applied on top of the configuration file.
#[derive(Args, Clone, Default)]
pub struct ExtractionOverrides {
    /// Label specification file
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Licence number to document table (JSON)
    #[arg(long)]
    lookup: Option<PathBuf>,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR fallback and match direct text only
    #[arg(long)]
    text_only: bool,

    /// Do not autocorrect OCR lines
    #[arg(long)]
    no_autocorrect: bool,
}

impl ExtractionOverrides {
    pub fn apply(&self, mut config: LicexConfig) -> LicexConfig {
        if let Some(labels) = &self.labels {
            config.extraction.labels = Some(labels.clone());
        }
        if let Some(lookup) = &self.lookup {
            config.extraction.licence_lookup = Some(lookup.clone());
        }
        if let Some(model_dir) = &self.model_dir {
            config.ocr.model_dir = model_dir.clone();
        }
        if self.text_only {
            config.ocr.enabled = false;
        }
        if self.no_autocorrect {
            config.extraction.auto_correct = false;
        }
        config
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON result tree
    Json,
    /// Indented plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = args.overrides.apply(super::load_config(config_path)?);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    info!("Processing file: {}", args.input.display());

    let extractor = DocumentExtractor::from_config(config)?;
    let input = args.input.clone();
    let result = tokio::task::spawn_blocking(move || extractor.extract(&input)).await??;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Text => format_text(&result),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    for warning in &result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), serde_json::to_string(warning)?);
    }
    info!("Processed {} in {:?}", result.filename, start.elapsed());

    Ok(())
}

/// Indented `group: value` listing of the result tree.
pub fn format_text(result: &DocumentResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} page(s){})",
        result.filename,
        result.number_of_pages,
        if result.scanned_file { ", scanned" } else { "" }
    );
    if !result.services_used.is_empty() {
        let _ = writeln!(out, "OCR: {}", result.services_used.join(", "));
    }
    for m in &result.matches {
        write_match(&mut out, m, 1);
    }
    out
}

fn write_match(out: &mut String, result: &LabelGroupResult, depth: usize) {
    let source = match (&result.service_name, result.is_ocr) {
        (Some(service), true) => format!(" [{}]", service),
        _ => String::new(),
    };
    let _ = writeln!(
        out,
        "{}{}: {}{}",
        "  ".repeat(depth),
        result.label_group_name,
        result.value(),
        source
    );
    for sub in &result.sub_results {
        write_match(out, sub, depth + 1);
    }
}
