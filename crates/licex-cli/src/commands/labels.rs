//! Labels command - inspect and validate label specifications.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use licex_core::{default_label_spec, LabelSpec, LabelToMatch};

/// Arguments for the labels command.
#[derive(Args)]
pub struct LabelsArgs {
    #[command(subcommand)]
    command: LabelsCommand,
}

#[derive(Subcommand)]
enum LabelsCommand {
    /// Print the active label specification as JSON
    Show {
        /// Print the built-in specification even when a file is configured
        #[arg(long)]
        builtin: bool,
    },

    /// Validate a label specification file
    Validate {
        /// Specification file
        file: PathBuf,
    },
}

pub async fn run(args: LabelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        LabelsCommand::Show { builtin } => {
            let config = super::load_config(config_path)?;
            let spec = match (&config.extraction.labels, builtin) {
                (Some(path), false) => LabelSpec::from_file(path)?,
                _ => default_label_spec(),
            };
            println!("{}", serde_json::to_string_pretty(&spec)?);
            Ok(())
        }
        LabelsCommand::Validate { file } => {
            let spec = LabelSpec::from_file(&file)?;
            let labels: usize = spec.groups.iter().flat_map(|g| g.labels.iter()).map(|l| count(l)).sum();
            println!(
                "{} {} is valid: {} group(s), {} label(s)",
                style("✓").green(),
                file.display(),
                spec.groups.len(),
                labels
            );
            Ok(())
        }
    }
}

fn count(label: &LabelToMatch) -> usize {
    1 + label.sub_labels.iter().map(|l| count(l)).sum::<usize>()
}
