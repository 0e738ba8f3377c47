//! Run configuration.
//!
//! A JSON file supplies defaults; command-line flags override individual
//! fields. The core only needs the resolved input and output base paths, the
//! time zone and the Parquet writer settings.
//!
//! ```json
//! {
//!   "input_data": "/data/sparkify/raw",
//!   "output_data": "/data/sparkify/lake",
//!   "timezone": "local",
//!   "parquet": { "compression": "snappy", "row_group_size": 65536 },
//!   "log_dir": null
//! }
//! ```

use crate::calendar::Zone;
use crate::error::{EtlError, Result};
use crate::sink::ParquetOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "sparkify.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Base path holding `song_data/` and `log_data/`
    pub input_data: Option<PathBuf>,
    /// Base path receiving the `<table>.parquet` directories
    pub output_data: Option<PathBuf>,
    pub timezone: Zone,
    pub parquet: ParquetOptions,
    /// Directory for rotating log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

/// Input and output locations after all overrides were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub input_data: PathBuf,
    pub output_data: PathBuf,
}

impl EtlConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            EtlError::Config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }

    /// Load `path` when given, else `sparkify.json` if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                EtlError::Config(format!(
                    "Failed to create config directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| {
            EtlError::Config(format!("Failed to write config {}: {e}", path.display()))
        })
    }

    /// Both base paths, or a configuration error naming the missing one.
    pub fn resolve_paths(&self) -> Result<ResolvedPaths> {
        let input_data = self.input_data.clone().ok_or_else(|| {
            EtlError::Config("input_data is not set (use --input or the config file)".to_owned())
        })?;
        let output_data = self.output_data.clone().ok_or_else(|| {
            EtlError::Config(
                "output_data is not set (use --output or the config file)".to_owned(),
            )
        })?;

        Ok(ResolvedPaths {
            input_data,
            output_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Compression;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EtlConfig =
            serde_json::from_str(r#"{ "input_data": "raw", "timezone": "utc" }"#).unwrap();

        assert_eq!(config.input_data, Some(PathBuf::from("raw")));
        assert_eq!(config.output_data, None);
        assert_eq!(config.timezone, Zone::Utc);
        assert_eq!(config.parquet, ParquetOptions::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/sparkify.json");
        let config = EtlConfig {
            input_data: Some(PathBuf::from("raw")),
            output_data: Some(PathBuf::from("lake")),
            timezone: Zone::Utc,
            parquet: ParquetOptions {
                compression: Compression::Zstd,
                row_group_size: 1024,
            },
            log_dir: None,
        };

        config.save(&path).unwrap();
        assert_eq!(EtlConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_output_is_a_config_error() {
        let config = EtlConfig {
            input_data: Some(PathBuf::from("raw")),
            ..Default::default()
        };

        let err = config.resolve_paths().unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
        assert!(err.to_string().contains("output_data"));
    }

    #[test]
    fn test_unreadable_config_is_a_config_error() {
        let err = EtlConfig::load(Path::new("/nonexistent/sparkify.json")).unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }
}
