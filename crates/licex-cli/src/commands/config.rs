//! `licex config`: inspect and edit the JSON run configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use licex_core::LicexConfig;

use super::default_config_path;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration (file values over defaults)
    Show,

    /// Write a configuration file holding every default
    Init {
        /// Where to write it (default: the --config path or the per-user file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value, e.g. `extraction.max_link_depth` or `ocr.model_dir`
    Get { key: String },

    /// Change one existing value; VALUE is read as JSON, falling back to a string
    Set { key: String, value: String },

    /// Print which configuration file licex reads and whether it exists
    Path,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path.map(PathBuf::from).unwrap_or_else(default_config_path);
    match args.command {
        ConfigCommand::Show => {
            if !path.exists() {
                eprintln!("{} {} does not exist; these are the defaults", style("ℹ").blue(), path.display());
            }
            println!("{}", serde_json::to_string_pretty(&read_or_default(&path)?)?);
        }
        ConfigCommand::Init { output, force } => {
            let output = output.unwrap_or(path);
            if output.exists() && !force {
                anyhow::bail!("{} already exists (pass --force to replace it)", output.display());
            }
            write_config(&output, &LicexConfig::default())?;
            println!("{} Wrote default configuration to {}", style("✓").green(), output.display());
        }
        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(read_or_default(&path)?)?;
            println!("{}", serde_json::to_string_pretty(get_key(&json, &key)?)?);
        }
        ConfigCommand::Set { key, value } => {
            let parsed = parse_value(&value);
            let mut json = serde_json::to_value(read_or_default(&path)?)?;
            set_key(&mut json, &key, parsed.clone())?;
            let config: LicexConfig = serde_json::from_value(json)
                .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
            write_config(&path, &config)?;
            println!(
                "{} {} = {} in {}",
                style("✓").green(),
                key,
                serde_json::to_string(&parsed)?,
                path.display()
            );
        }
        ConfigCommand::Path => {
            let status = if path.exists() {
                style("exists").green()
            } else {
                style("missing, defaults apply (create it with `licex config init`)").yellow()
            };
            println!("{} ({})", path.display(), status);
        }
    }
    Ok(())
}

fn read_or_default(path: &Path) -> anyhow::Result<LicexConfig> {
    if path.exists() {
        Ok(LicexConfig::from_file(path)?)
    } else {
        Ok(LicexConfig::default())
    }
}

fn write_config(path: &Path, config: &LicexConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    Ok(())
}

fn parse_value(value: &str) -> Value {
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn get_key<'v>(json: &'v Value, key: &str) -> anyhow::Result<&'v Value> {
    key.split('.').try_fold(json, |current, part| {
        current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
    })
}

/// Replace an existing leaf; unknown keys are rejected rather than added.
fn set_key(json: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    let (parent, leaf) = match key.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, key),
    };
    let mut current = json;
    if let Some(parent) = parent {
        for part in parent.split('.') {
            current = current
                .get_mut(part)
                .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
        }
    }
    let object = current
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Cannot set value at non-object path: {}", key))?;
    if !object.contains_key(leaf) {
        anyhow::bail!("Configuration key not found: {}", key);
    }
    object.insert(leaf.to_string(), value);
    Ok(())
}
