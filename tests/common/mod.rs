//! Shared test utilities for the integration suite.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;
use vectext_storage::options::MIN_SEGMENT_SIZE;
use vectext::{
    Database, EmbeddingProvider, EmbeddingVector, PoolingMode, ProviderError, VectextConfig,
};

// ============================================================================
// Providers
// ============================================================================

/// Deterministic provider: text bytes folded onto `dimension` components.
///
/// Texts that share a long prefix land close together.
pub struct FoldingProvider {
    pub dimension: usize,
}

impl EmbeddingProvider for FoldingProvider {
    fn embed(&self, text: &str, _pooling: PoolingMode) -> Result<EmbeddingVector, ProviderError> {
        if text.is_empty() {
            return Err("empty text".into());
        }
        let mut v = vec![0.5; self.dimension];
        for (i, b) in text.bytes().enumerate() {
            v[i % self.dimension] += f64::from(b) / (1.0 + (i / self.dimension) as f64);
        }
        Ok(v)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// TestDb
// ============================================================================

/// Database in a temporary directory, maintenance off and no fsync.
pub struct TestDb {
    pub db: Database,
    pub dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: VectextConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::open_with_config(dir.path(), provider(), config).unwrap();
        TestDb { db, dir }
    }

    /// Close and reopen the database in the same directory.
    pub fn reopen(self) -> Self {
        let TestDb { db, dir } = self;
        db.close().unwrap();
        drop(db);
        let db = Database::open(dir.path(), provider()).unwrap();
        TestDb { db, dir }
    }
}

pub fn provider() -> Arc<dyn EmbeddingProvider> {
    Arc::new(FoldingProvider { dimension: 16 })
}

pub fn test_config() -> VectextConfig {
    let mut config = VectextConfig::default();
    config.sync_writes = false;
    config.maintenance.enabled = false;
    config
}

/// Config with the smallest segments the store accepts.
pub fn small_segment_config() -> VectextConfig {
    let mut config = test_config();
    config.segment_size = MIN_SEGMENT_SIZE;
    config
}
