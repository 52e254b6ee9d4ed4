//! Configuration types for datastore.
//!
//! Settings are loaded from an optional `datastore.toml`:
//!
//! ```toml
//! [store]
//! path = "data.db"    # random name in the working directory if absent
//! backend = "sqlite"  # sqlite | redb | memory
//!
//! [log]
//! level = "info"
//! ```
//!
//! Every section is optional and falls back to defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Backing engine selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Single SQLite file (default).
    #[default]
    Sqlite,
    /// Single redb file.
    Redb,
    /// Process memory; nothing is written to disk.
    Memory,
}

/// datastore.toml root.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub backend: BackendKind,
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    constants::DEFAULT_LOG_LEVEL.to_string()
}

impl Config {
    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields are unknown or have invalid types
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load an explicit config file, or `datastore.toml` from the working
    /// directory if it exists, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be loaded.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let default_path = Path::new(constants::DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load_from(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails with one or more errors:
    /// - Empty store path
    /// - Store path pointing at an existing directory
    /// - Empty log level
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Some(path) = &self.store.path {
            if path.as_os_str().is_empty() {
                errors.push("store.path cannot be empty".to_string());
            } else if path.is_dir() {
                errors.push(format!(
                    "store.path must be a file, but '{}' is a directory",
                    path.display()
                ));
            }

            if self.store.backend == BackendKind::Memory {
                warnings.push(format!(
                    "store.path '{}' is ignored by the memory backend",
                    path.display()
                ));
            }
        }

        if self.log.level.trim().is_empty() {
            errors.push("log.level cannot be empty".to_string());
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.store.backend, BackendKind::Sqlite);
        assert!(config.store.path.is_none());
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
            [store]
            path = "data/kv.redb"
            backend = "redb"

            [log]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.backend, BackendKind::Redb);
        assert_eq!(config.store.path, Some(PathBuf::from("data/kv.redb")));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [store]
            backend = "postgres"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [store]
            pth = "typo.db"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("datastore.toml");
        fs::write(&path, "[store]\nbackend = \"memory\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store.backend, BackendKind::Memory);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load_from(tmp.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[log]\nlevel = \"trace\"\n").unwrap();

        let config = Config::discover(Some(&path)).unwrap();
        assert_eq!(config.log.level, "trace");
    }

    #[test]
    fn test_validate_rejects_directory_path() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            store: StoreConfig {
                path: Some(tmp.path().to_path_buf()),
                backend: BackendKind::Sqlite,
            },
            log: LogConfig::default(),
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }

    #[test]
    fn test_validate_rejects_empty_level() {
        let config = Config {
            store: StoreConfig::default(),
            log: LogConfig {
                level: "  ".to_string(),
            },
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_warns_on_memory_with_path() {
        let config = Config {
            store: StoreConfig {
                path: Some(PathBuf::from("ignored.db")),
                backend: BackendKind::Memory,
            },
            log: LogConfig::default(),
        };

        let result = config.validate().unwrap();
        assert!(result.has_warnings());
        assert!(result.warnings[0].contains("ignored.db"));
    }
}
