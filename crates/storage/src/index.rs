//! In-memory MVCC index
//!
//! Every key maps to a `VersionChain` holding the versions still visible to
//! some reader, newest first. Each version keeps its value bytes and the
//! location of the value log record that persists it.

use std::collections::VecDeque;
use std::sync::Arc;

/// Where a version is persisted in the value log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueLocation {
    /// Segment number
    pub segment: u64,
    /// Offset of the record within the segment
    pub offset: u64,
}

/// One committed version of a key
#[derive(Debug, Clone)]
pub struct VersionedEntry {
    /// Commit version
    pub version: u64,
    /// Value bytes
    pub value: Arc<[u8]>,
    /// Record holding this version on disk
    pub location: ValueLocation,
}

/// Version chain for MVCC
///
/// Versions are stored in descending order (newest first) for efficient
/// snapshot reads - we typically want the most recent version <= snapshot_version.
#[derive(Debug, Clone)]
pub struct VersionChain {
    versions: VecDeque<VersionedEntry>,
}

impl VersionChain {
    /// Create a new version chain with a single version
    pub fn new(entry: VersionedEntry) -> Self {
        let mut versions = VecDeque::with_capacity(2);
        versions.push_front(entry);
        Self { versions }
    }

    /// Add a new version (must be newer than existing versions)
    ///
    /// Returns the entry it superseded, if any.
    pub fn push(&mut self, entry: VersionedEntry) -> Option<&VersionedEntry> {
        debug_assert!(
            self.latest().map_or(true, |l| l.version < entry.version),
            "versions must be pushed in increasing order"
        );
        self.versions.push_front(entry);
        self.versions.get(1)
    }

    /// Get the version at or before the given max_version
    pub fn get_at_version(&self, max_version: u64) -> Option<&VersionedEntry> {
        self.versions.iter().find(|e| e.version <= max_version)
    }

    /// Get the latest version
    #[inline]
    pub fn latest(&self) -> Option<&VersionedEntry> {
        self.versions.front()
    }

    /// Mutable access to the entry with exactly `version`
    pub fn entry_mut(&mut self, version: u64) -> Option<&mut VersionedEntry> {
        self.versions.iter_mut().find(|e| e.version == version)
    }

    /// Drop versions no reader at `keep_from` or later can observe.
    ///
    /// Keeps every version newer than `keep_from` plus the newest version at
    /// or below it.
    pub fn prune(&mut self, keep_from: u64) {
        if let Some(pos) = self.versions.iter().position(|e| e.version <= keep_from) {
            self.versions.truncate(pos + 1);
        }
    }

    /// Number of versions stored
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }
}
