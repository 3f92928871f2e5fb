//! Application configuration, loaded from ~/.plata/config.toml.
//!
//! Every field has a default so a missing file just means defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// How many months the dashboard series covers by default.
pub const DEFAULT_SERIES_MONTHS: usize = 6;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Override for the database file location
    pub db_path: Option<PathBuf>,
    /// Rolling window length for `plata series`
    pub series_months: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: None,
            series_months: DEFAULT_SERIES_MONTHS,
        }
    }
}

impl AppConfig {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<AppConfig> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        let path = PathBuf::from(home).join(".plata").join("config.toml");
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &std::path::Path) -> Result<AppConfig> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read config at {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&raw).context(format!("Failed to parse config at {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.db_path.is_none());
        assert_eq!(config.series_months, DEFAULT_SERIES_MONTHS);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.series_months, DEFAULT_SERIES_MONTHS);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "series_months = 12").unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.series_months, 12);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "series_months = \"six\"").unwrap();
        assert!(AppConfig::load_from_path(&path).is_err());
    }
}
