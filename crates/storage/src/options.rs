//! Store configuration.

use vectext_core::StoreError;

/// Smallest accepted segment size
pub const MIN_SEGMENT_SIZE: u64 = 1024;

/// Store configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// fsync the active segment on every commit (default: true).
    pub sync_writes: bool,

    /// Segment size in bytes after which a new segment is started
    /// (default: 64MB).
    ///
    /// Only sealed segments are candidates for space reclamation.
    pub segment_size: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            sync_writes: true,
            segment_size: 64 * 1024 * 1024,
        }
    }
}

impl StoreOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fsync-per-commit (builder pattern).
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Set segment size (builder pattern).
    pub fn with_segment_size(mut self, size: u64) -> Self {
        self.segment_size = size;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.segment_size < MIN_SEGMENT_SIZE {
            return Err(StoreError::InvalidOptions(format!(
                "segment_size must be at least {} bytes, got {}",
                MIN_SEGMENT_SIZE, self.segment_size
            )));
        }
        Ok(())
    }

    /// Options for tests: small segments, no fsync.
    pub fn for_testing() -> Self {
        StoreOptions {
            sync_writes: false,
            segment_size: 4 * 1024,
        }
    }
}
