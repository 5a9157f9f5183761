//! COA Settings
//!
//! Persistent settings for the COA tools:
//! - API settings (backend base URL, bearer token, request timeout)
//! - Grid settings (column phases, upload highlight duration)
//! - Cache settings (offline record cache location)
//!
//! Settings are stored as `settings.json` in the `coa` config directory.
//! `COA_API_BASE_URL` and `COA_API_TOKEN` override the stored API values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod settings_file;

pub use settings_file::*;

/// Environment variable overriding [`ApiSettings::base_url`]
pub const ENV_API_BASE_URL: &str = "COA_API_BASE_URL";
/// Environment variable overriding [`ApiSettings::token`]
pub const ENV_API_TOKEN: &str = "COA_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoaSettings {
    pub api: ApiSettings,
    pub grid: GridSettings,
    pub cache: CacheSettings,
}

impl CoaSettings {
    /// Load from the default settings file, falling back to defaults when it
    /// does not exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;
        let mut settings = Self::load_from(&path)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        settings_file()
    }

    /// Apply overrides from a variable lookup; empty values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = lookup(ENV_API_BASE_URL) {
            self.api.base_url = base_url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.api.token = Some(token);
        }
    }

    /// Cache directory, if caching is enabled
    pub fn cache_dir(&self) -> Result<Option<PathBuf>> {
        if !self.cache.enabled {
            return Ok(None);
        }
        match &self.cache.dir {
            Some(dir) => Ok(Some(dir.clone())),
            None => cache_dir().map(Some),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// Bearer token for authenticated endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Phase requested for the column list
    pub default_phase: String,
    /// Phase requested for the column metadata
    pub config_phase: String,
    /// Seconds newly uploaded rows stay highlighted
    pub highlight_secs: u64,
}

impl GridSettings {
    pub fn highlight(&self) -> Duration {
        Duration::from_secs(self.highlight_secs)
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            default_phase: "1".to_string(),
            config_phase: "phase1-config".to_string(),
            highlight_secs: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Overrides the default cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = CoaSettings::default();
        assert_eq!(settings.api.base_url, "http://localhost:4000");
        assert_eq!(settings.api.timeout(), Duration::from_secs(30));
        assert_eq!(settings.grid.config_phase, "phase1-config");
        assert_eq!(settings.grid.highlight(), Duration::from_secs(3));
        assert!(settings.cache.enabled);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CoaSettings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, CoaSettings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"api":{"base_url":"https://coa.example"}}"#).unwrap();

        let settings = CoaSettings::load_from(&path).unwrap();
        assert_eq!(settings.api.base_url, "https://coa.example");
        assert_eq!(settings.api.timeout_secs, 30);
        assert_eq!(settings.grid, GridSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = CoaSettings::default();
        settings.grid.default_phase = "2".to_string();
        settings.cache.dir = Some(dir.path().join("cache"));

        settings.save_to(&path).unwrap();
        assert_eq!(CoaSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{").unwrap();
        assert!(CoaSettings::load_from(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let env = HashMap::from([
            (ENV_API_BASE_URL, "http://api:9000".to_string()),
            (ENV_API_TOKEN, "  ".to_string()),
        ]);
        let mut settings = CoaSettings::default();
        settings.apply_overrides(|key| env.get(key).cloned());

        assert_eq!(settings.api.base_url, "http://api:9000");
        assert_eq!(settings.api.token, None);
    }

    #[test]
    fn test_cache_dir_respects_toggle() {
        let mut settings = CoaSettings::default();
        settings.cache.dir = Some(PathBuf::from("/tmp/coa-cache"));
        assert_eq!(
            settings.cache_dir().unwrap(),
            Some(PathBuf::from("/tmp/coa-cache"))
        );

        settings.cache.enabled = false;
        assert_eq!(settings.cache_dir().unwrap(), None);
    }
}
