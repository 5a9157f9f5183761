//! Settings file utilities
//!
//! Settings live under the platform config directory, the record cache and
//! log files under the platform data directory, both in a `coa` folder.

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "coa";

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join(APP_DIR))
}

pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .context("Could not determine data directory")
        .map(|p| p.join(APP_DIR))
}

/// Default location of the offline record cache
pub fn cache_dir() -> Result<PathBuf> {
    data_dir().map(|p| p.join("cache"))
}

/// Rolling JSON log files
pub fn logs_dir() -> Result<PathBuf> {
    data_dir().map(|p| p.join("logs"))
}

pub fn settings_file() -> Result<PathBuf> {
    config_dir().map(|p| p.join("settings.json"))
}

/// Create every application directory that does not exist yet.
///
/// Returns the directories that were created.
pub fn ensure_directories() -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for dir in [config_dir()?, cache_dir()?, logs_dir()?] {
        if dir.exists() {
            continue;
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;
        tracing::debug!(dir = %dir.display(), "Created application directory");
        created.push(dir);
    }
    Ok(created)
}
