//! Database configuration via `vectext.toml`
//!
//! On first open, a default `vectext.toml` is created in the data directory.
//! To change settings, edit the file and reopen the database.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vectext_core::{Error, PoolingMode, Result};
use vectext_storage::StoreOptions;

use crate::maintenance::MaintenanceConfig;

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "vectext.toml";

/// Background reclamation settings, the `[maintenance]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceSettings {
    /// Run the maintenance task (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between reclamation cycles (default: 300)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Minimum discard ratio for a segment to be rewritten (default: 0.7)
    #[serde(default = "default_discard_ratio")]
    pub discard_ratio: f64,
    /// Reclamation rounds per cycle at most (default: 16)
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            discard_ratio: default_discard_ratio(),
            max_rounds: default_max_rounds(),
        }
    }
}

/// Database configuration loaded from `vectext.toml`.
///
/// # Example
///
/// ```toml
/// sync_writes = true
/// pooling = "mean"
///
/// [maintenance]
/// interval_secs = 300
/// discard_ratio = 0.7
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectextConfig {
    /// fsync every commit (default: true)
    #[serde(default = "default_true")]
    pub sync_writes: bool,
    /// Value log segment size in bytes (default: 64MB)
    #[serde(default = "default_segment_size")]
    pub segment_size: u64,
    /// Pooling mode passed to the embedding provider (default: "mean")
    #[serde(default)]
    pub pooling: PoolingMode,
    /// Dimension of the built-in hashing embedder (default: 384)
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Background reclamation
    #[serde(default)]
    pub maintenance: MaintenanceSettings,
}

fn default_true() -> bool {
    true
}

fn default_segment_size() -> u64 {
    StoreOptions::default().segment_size
}

fn default_dimension() -> usize {
    vectext_core::embed::DEFAULT_DIMENSION
}

fn default_interval_secs() -> u64 {
    300
}

fn default_discard_ratio() -> f64 {
    0.7
}

fn default_max_rounds() -> usize {
    16
}

impl Default for VectextConfig {
    fn default() -> Self {
        Self {
            sync_writes: true,
            segment_size: default_segment_size(),
            pooling: PoolingMode::default(),
            dimension: default_dimension(),
            maintenance: MaintenanceSettings::default(),
        }
    }
}

impl VectextConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# vectext database configuration
#
# fsync the value log on every commit (default: true)
#   true  = zero data loss on crash
#   false = faster bulk ingestion, may lose the last commits on crash
sync_writes = true

# Value log segment size in bytes (default: 64MB).
# Only full (sealed) segments are candidates for space reclamation.
segment_size = 67108864

# Pooling mode for embeddings: "mean" (default), "max" or "cls"
pooling = "mean"

# Dimension of the built-in hashing embedder (default: 384)
dimension = 384

[maintenance]
# Run background space reclamation (default: true)
enabled = true
# Seconds between reclamation cycles (default: 300)
interval_secs = 300
# Rewrite a segment once this fraction of it is garbage (default: 0.7)
discard_ratio = 0.7
# Reclamation rounds per cycle at most (default: 16)
max_rounds = 16
"#
    }

    /// Check every setting.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(Error::config("dimension must be positive"));
        }
        self.store_options()
            .validate()
            .map_err(|e| Error::config(e.to_string()))?;
        if self.maintenance.interval_secs == 0 {
            return Err(Error::config("maintenance.interval_secs must be positive"));
        }
        self.maintenance_config().validate()
    }

    /// Store options derived from this config.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::new()
            .with_sync_writes(self.sync_writes)
            .with_segment_size(self.segment_size)
    }

    /// Maintenance task configuration derived from this config.
    pub fn maintenance_config(&self) -> MaintenanceConfig {
        MaintenanceConfig {
            interval: Duration::from_secs(self.maintenance.interval_secs),
            discard_ratio: self.maintenance.discard_ratio,
            max_rounds: self.maintenance.max_rounds,
        }
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: VectextConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
