//! Read snapshots and iteration
//!
//! A `ReadSnapshot` pins a commit version. Reads through it only see versions
//! committed at or before that version, no matter how many commits land
//! afterwards. While a snapshot is alive the store keeps the versions it can
//! observe; dropping the last handle at a version releases them.
//!
//! # Design Notes
//!
//! - **Lazy**: Nothing is copied at snapshot time; reads go to the live index
//!   with version filtering.
//! - **Short locks**: The iterator re-seeks the index for every step and holds
//!   the read lock only for that step, so writers are never blocked for the
//!   duration of a scan.
//! - **Key order**: Iteration yields keys in ascending byte order.

use std::sync::Arc;

use vectext_core::StoreError;

use crate::store::Store;

/// Options for snapshot iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IteratorOptions {
    /// Load values alongside keys (default: true).
    ///
    /// Key-only scans leave this off; `Item::value` then returns `None`.
    pub prefetch_values: bool,
}

impl Default for IteratorOptions {
    fn default() -> Self {
        IteratorOptions {
            prefetch_values: true,
        }
    }
}

impl IteratorOptions {
    /// Key-only iteration
    pub fn keys_only() -> Self {
        IteratorOptions {
            prefetch_values: false,
        }
    }
}

/// A consistent point-in-time view of a store
///
/// # Example
///
/// ```ignore
/// let snapshot = store.snapshot()?;
/// store.update(|txn| txn.set(b"k".to_vec(), b"new".to_vec()))?;
///
/// // Writes after snapshot creation are not visible
/// assert_eq!(snapshot.get(b"k")?, None);
/// ```
pub struct ReadSnapshot {
    store: Arc<Store>,
    version: u64,
}

impl ReadSnapshot {
    pub(crate) fn new(store: Arc<Store>) -> Self {
        let version = store.register_snapshot();
        ReadSnapshot { store, version }
    }

    /// Commit version this snapshot observes
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Point lookup
    ///
    /// Returns `Ok(None)` if the key had no value at the snapshot version.
    /// Fails with `StoreError::Closed` once the store has been closed.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if self.store.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(self
            .store
            .read_at(key, self.version)
            .map(|value| value.to_vec()))
    }

    /// Iterate all keys visible at the snapshot version, in key order.
    pub fn iter(&self, options: IteratorOptions) -> SnapshotIter {
        SnapshotIter {
            snapshot: self.clone(),
            last_key: None,
            prefetch_values: options.prefetch_values,
            done: false,
        }
    }
}

impl Clone for ReadSnapshot {
    fn clone(&self) -> Self {
        self.store.retain_snapshot(self.version);
        ReadSnapshot {
            store: Arc::clone(&self.store),
            version: self.version,
        }
    }
}

impl Drop for ReadSnapshot {
    fn drop(&mut self) {
        self.store.release_snapshot(self.version);
    }
}

impl std::fmt::Debug for ReadSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSnapshot")
            .field("version", &self.version)
            .finish()
    }
}

/// One key yielded by a `SnapshotIter`
#[derive(Debug, Clone)]
pub struct Item {
    key: Vec<u8>,
    version: u64,
    value: Option<Arc<[u8]>>,
}

impl Item {
    pub(crate) fn new(key: Vec<u8>, version: u64, value: Option<Arc<[u8]>>) -> Self {
        Item {
            key,
            version,
            value,
        }
    }

    /// Key bytes
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Consume the item, returning the owned key
    pub fn into_key(self) -> Vec<u8> {
        self.key
    }

    /// Commit version that wrote this value
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Value bytes, if the iterator prefetched values
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }
}

/// Iterator over a snapshot, in ascending key order
///
/// Owns its own snapshot handle, so it may outlive the `ReadSnapshot` it was
/// created from.
pub struct SnapshotIter {
    snapshot: ReadSnapshot,
    last_key: Option<Vec<u8>>,
    prefetch_values: bool,
    done: bool,
}

impl SnapshotIter {
    /// The snapshot this iterator reads from
    pub fn snapshot(&self) -> &ReadSnapshot {
        &self.snapshot
    }
}

impl Iterator for SnapshotIter {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        if self.done {
            return None;
        }
        let next = self.snapshot.store.next_visible(
            self.last_key.as_deref(),
            self.snapshot.version,
            self.prefetch_values,
        );
        match next {
            Some(item) => {
                self.last_key = Some(item.key.clone());
                Some(item)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for SnapshotIter {}

impl std::fmt::Debug for SnapshotIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotIter")
            .field("version", &self.snapshot.version)
            .field("prefetch_values", &self.prefetch_values)
            .field("done", &self.done)
            .finish()
    }
}
