//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod labels;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use licex_core::LicexConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("licex")
        .join("config.json")
}

/// Configuration from an explicit path, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<LicexConfig> {
    if let Some(path) = config_path {
        return Ok(LicexConfig::from_file(Path::new(path))?);
    }
    let path = default_config_path();
    if path.exists() {
        debug!("Using config file {}", path.display());
        Ok(LicexConfig::from_file(&path)?)
    } else {
        Ok(LicexConfig::default())
    }
}
