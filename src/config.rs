//! Configuration management for schema remapping
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (remap.toml)
//! - Environment variables (REMAP__*)
//!
//! ## Example config file (remap.toml):
//! ```toml
//! [catalog]
//! path = "./catalog.json"
//! pretty = true
//!
//! [conversion]
//! on_record_error = "continue"
//!
//! [logging]
//! filter = "schema_remap=info"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::convert::{ConversionExecutor, FailurePolicy};
use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemapConfig {
    /// Catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Conversion settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the catalog JSON file
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,

    /// Pretty-print catalogs when writing them back
    #[serde(default = "default_true")]
    pub pretty: bool,
}

/// Conversion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Whether a failed record stops the rest of the batch
    #[serde(default)]
    pub on_record_error: FailurePolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_filter")]
    pub filter: String,
}

// Default value functions
fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog.json")
}

fn default_true() -> bool {
    true
}

fn default_filter() -> String {
    "schema_remap=info".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            pretty: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl RemapConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["remap.toml", ".remap.toml", "config/remap.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "schema-remap") {
            let xdg_config = config_dir.config_dir().join("remap.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (REMAP__*)
        builder = builder.add_source(
            Environment::with_prefix("REMAP")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Executor configured with the failure policy
    pub fn executor(&self) -> ConversionExecutor {
        ConversionExecutor::new(self.conversion.on_record_error)
    }

    /// Get the catalog path (resolves relative paths)
    pub fn catalog_path(&self) -> PathBuf {
        if self.catalog.path.is_absolute() {
            self.catalog.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.catalog.path)
        }
    }
}
