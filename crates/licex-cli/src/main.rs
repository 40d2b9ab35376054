//! `licex`: pull licence holders, numbers, abstraction limits and linked
//! licences out of water-abstraction licence documents.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{batch, config, labels, process};

/// Environment variable overriding the `-v` log filter (e.g. `licex_core=trace`).
const LOG_ENV: &str = "LICEX_LOG";

/// Extract structured facts from scanned and digital licence documents
#[derive(Parser)]
#[command(name = "licex", version, about, long_about = None)]
struct Cli {
    /// Log more: -v matches and sources, -vv strategies, -vvv heuristics
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: <config dir>/licex/config.json)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one licence document (PDF or text) to a JSON match tree
    Process(process::ProcessArgs),

    /// Extract every licence matching a glob through a pool of extractors
    Batch(batch::BatchArgs),

    /// Show, create or edit the licex configuration file
    Config(config::ConfigArgs),

    /// Print the active label specification or check a specification file
    Labels(labels::LabelsArgs),
}

fn log_filter(verbose: u8) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return filter;
    }
    let directive = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::new(directive)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries results; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_target(cli.verbose > 2)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
        Commands::Labels(args) => labels::run(args, config_path).await,
    }
}
