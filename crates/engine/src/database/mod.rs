//! Database: the main entry point
//!
//! The Database ties the pieces together:
//! - Opens (or creates) the store in a data directory
//! - Loads `vectext.toml` from that directory
//! - Owns the embedding provider used for ingestion and queries
//! - Runs the background maintenance task
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vectext_core::HashingEmbedder;
//! use vectext_engine::Database;
//!
//! let db = Database::open("./my-db", Arc::new(HashingEmbedder::default()))?;
//! db.insert_texts(["Hello, world!", "Lorem ipsum dolor sit amet."])?;
//!
//! let nearest = db.find_nearest("placeholder text")?;
//! println!("{}", nearest.text);
//! db.close()?;
//! ```

pub mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};
use vectext_core::{EmbeddingProvider, Result, StoreError};
use vectext_storage::{Store, StoreStats};

use crate::maintenance::{run_reclaim_cycle, MaintenanceHandle, MaintenanceTask, ReclaimOutcome};
use crate::resolver::{self, Nearest};
use crate::scanner::{scan_all, RecordScan};
use crate::writer;

pub use config::{MaintenanceSettings, VectextConfig, CONFIG_FILE_NAME};

/// An open vectext database
pub struct Database {
    data_dir: PathBuf,
    store: Arc<Store>,
    provider: Arc<dyn EmbeddingProvider>,
    config: VectextConfig,
    /// Taken on close
    maintenance: Mutex<Option<MaintenanceHandle>>,
}

impl Database {
    /// Open (or create) a database in `path`.
    ///
    /// Reads `vectext.toml` from the directory, writing the default file
    /// first if there is none.
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the config file is unreadable or invalid
    /// - `Error::Store` if the store cannot be opened (locked by another
    ///   process, corrupted, I/O failure)
    pub fn open(path: impl AsRef<Path>, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();
        create_data_dir(&data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        VectextConfig::write_default_if_missing(&config_path)?;
        let config = VectextConfig::from_file(&config_path)?;

        Self::open_inner(data_dir, provider, config)
    }

    /// Open (or create) a database in `path` with the given config.
    ///
    /// The config is written to `vectext.toml`, replacing any existing file,
    /// so later plain `open` calls pick it up.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        provider: Arc<dyn EmbeddingProvider>,
        config: VectextConfig,
    ) -> Result<Self> {
        config.validate()?;
        let data_dir = path.as_ref().to_path_buf();
        create_data_dir(&data_dir)?;
        config.write_to_file(&data_dir.join(CONFIG_FILE_NAME))?;

        Self::open_inner(data_dir, provider, config)
    }

    fn open_inner(
        data_dir: PathBuf,
        provider: Arc<dyn EmbeddingProvider>,
        config: VectextConfig,
    ) -> Result<Self> {
        let store = Store::open(&data_dir, config.store_options())?;

        let maintenance = if config.maintenance.enabled {
            Some(MaintenanceTask::start(
                Arc::clone(&store),
                config.maintenance_config(),
            )?)
        } else {
            None
        };

        info!(
            target: "vectext::db",
            path = ?data_dir,
            pooling = %config.pooling,
            provider_dimension = provider.dimension(),
            maintenance = config.maintenance.enabled,
            "Database opened"
        );

        Ok(Database {
            data_dir,
            store,
            provider,
            config,
            maintenance: Mutex::new(maintenance),
        })
    }

    /// Data directory
    pub fn path(&self) -> &Path {
        &self.data_dir
    }

    /// Active configuration
    pub fn config(&self) -> &VectextConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Embed and store every text in one transaction.
    ///
    /// Returns the number of records written.
    pub fn insert_texts<I, T>(&self, texts: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        writer::insert_texts(&self.store, &*self.provider, self.config.pooling, texts)
    }

    /// Store pre-computed (text, vector) pairs in one transaction.
    pub fn insert_vectors<I, T, V>(&self, pairs: I) -> Result<usize>
    where
        I: IntoIterator<Item = (T, V)>,
        T: AsRef<str>,
        V: AsRef<[f64]>,
    {
        writer::insert_batch(&self.store, pairs)
    }

    /// Stored text nearest to `query`.
    pub fn find_nearest(&self, query: &str) -> Result<Nearest> {
        resolver::find_nearest(&self.store, &*self.provider, self.config.pooling, query)
    }

    /// Stored text nearest to a caller-supplied vector.
    pub fn find_nearest_to_vector(&self, query: &[f64]) -> Result<Nearest> {
        resolver::find_nearest_to_vector(&self.store, query)
    }

    /// Scan every stored record.
    pub fn records(&self) -> Result<RecordScan> {
        scan_all(&self.store, None)
    }

    /// Run one reclamation cycle now, with the configured ratio and bound.
    pub fn reclaim_now(&self) -> Result<ReclaimOutcome> {
        let settings = &self.config.maintenance;
        run_reclaim_cycle(&self.store, settings.discard_ratio, settings.max_rounds)
    }

    /// Store statistics
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Stop maintenance, then flush and close the store.
    ///
    /// Later operations fail with `StoreError::Closed`. Calling `close`
    /// again is a no-op.
    pub fn close(&self) -> Result<()> {
        if let Some(handle) = self.maintenance.lock().take() {
            handle.shutdown();
        }
        self.store.close()?;
        info!(target: "vectext::db", path = ?self.data_dir, "Database closed");
        Ok(())
    }
}

fn create_data_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(StoreError::from)?;
    Ok(())
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Some(handle) = self.maintenance.get_mut().take() {
            handle.shutdown();
        }
        if let Err(e) = self.store.close() {
            warn!(target: "vectext::db", error = %e, "Failed to close store on drop");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.data_dir)
            .field("config", &self.config)
            .finish()
    }
}
