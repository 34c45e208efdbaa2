//! Store: a persistent, transactional ordered key-value store
//!
//! # Architecture
//!
//! - **Value log**: every committed transaction is appended as one
//!   checksummed record to the active segment (see `format`).
//! - **Index**: an in-memory `BTreeMap` from key to `VersionChain`, rebuilt by
//!   replaying the segments on open.
//! - **MVCC**: commits get monotonically increasing versions. Readers pin a
//!   version through a `ReadSnapshot`; chains keep every version some live
//!   snapshot can still observe.
//! - **Reclamation**: superseded versions leave garbage behind in their
//!   segments. `reclaim` rewrites the live part of the dirtiest sealed
//!   segment and deletes it.
//!
//! # Locking
//!
//! The value log mutex is the commit lock: commits and reclamation hold it
//! for their whole duration and take the index write lock inside it.
//! Readers only ever take the index read lock.

use std::collections::BTreeMap;
use std::fs::File;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use vectext_core::StoreError;

use crate::format::{entry_size, LogRecord, Segment, SEGMENT_HEADER_SIZE};
use crate::index::{ValueLocation, VersionChain, VersionedEntry};
use crate::options::StoreOptions;
use crate::snapshot::{Item, ReadSnapshot};
use crate::transaction::WriteTxn;
use crate::vlog::{SegmentStats, ValueLog};

const LOCK_FILE: &str = ".lock";

/// Point-in-time store statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Latest committed version
    pub version: u64,
    /// Number of keys with a value
    pub keys: usize,
    /// Number of value log segments on disk
    pub segments: usize,
    /// Entry bytes across all segments
    pub total_bytes: u64,
    /// Entry bytes superseded by newer versions
    pub discard_bytes: u64,
}

/// Persistent ordered key-value store
pub struct Store {
    dir: PathBuf,
    index: RwLock<BTreeMap<Vec<u8>, VersionChain>>,
    log: Mutex<ValueLog>,
    /// Latest published commit version
    version: AtomicU64,
    /// Live snapshot versions with their handle counts
    snapshots: Mutex<BTreeMap<u64, usize>>,
    closed: AtomicBool,
    /// Held for the lifetime of the store; released on drop
    _lock_file: File,
}

impl Store {
    /// Open (or create) the store in `dir`.
    ///
    /// Replays every value log segment to rebuild the index. A torn record
    /// at the end of the last segment is truncated away, and a last segment
    /// whose header is short or blank is removed; damage anywhere else fails
    /// with `StoreError::Corruption`.
    ///
    /// Fails with `StoreError::Locked` if another process holds the store.
    pub fn open(dir: impl AsRef<Path>, options: StoreOptions) -> Result<Arc<Self>, StoreError> {
        options.validate()?;
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(dir.join(LOCK_FILE))?;
        fs2::FileExt::try_lock_exclusive(&lock_file)
            .map_err(|_| StoreError::Locked(dir.clone()))?;

        let replayed = replay(&dir)?;
        let store_uuid = replayed
            .store_uuid
            .unwrap_or_else(|| *uuid::Uuid::new_v4().as_bytes());

        let active = match replayed.tail {
            Some((segment, valid_end)) => Segment::open_append(&dir, segment, valid_end)?,
            None => Segment::create(&dir, 1, store_uuid)?,
        };

        info!(
            target: "vectext::store",
            path = ?dir,
            records = replayed.records,
            keys = replayed.index.len(),
            segments = replayed.stats.len().max(1),
            version = replayed.max_version,
            "Store opened"
        );

        let log = ValueLog::new(&dir, store_uuid, options, active, replayed.stats);
        Ok(Arc::new(Store {
            dir,
            index: RwLock::new(replayed.index),
            log: Mutex::new(log),
            version: AtomicU64::new(replayed.max_version),
            snapshots: Mutex::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
            _lock_file: lock_file,
        }))
    }

    /// Directory holding the store files
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Latest committed version
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// True once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Run `f` in a write transaction and commit its writes atomically.
    ///
    /// If `f` returns `Err`, nothing is written and the error is returned
    /// as-is. Commit failures are converted into `E`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// store.update(|txn| {
    ///     txn.set(b"a".to_vec(), b"1".to_vec())?;
    ///     txn.set(b"b".to_vec(), b"2".to_vec())?;
    ///     Ok::<_, StoreError>(())
    /// })?;
    /// ```
    pub fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut WriteTxn) -> Result<T, E>,
        E: From<StoreError>,
    {
        if self.is_closed() {
            return Err(StoreError::Closed.into());
        }
        let mut txn = WriteTxn::new();
        let out = f(&mut txn)?;
        self.commit(txn)?;
        Ok(out)
    }

    /// Run `f` against a read snapshot taken now.
    pub fn view<T, E, F>(self: &Arc<Self>, f: F) -> Result<T, E>
    where
        F: FnOnce(&ReadSnapshot) -> Result<T, E>,
        E: From<StoreError>,
    {
        let snapshot = self.snapshot()?;
        f(&snapshot)
    }

    /// Take a read snapshot at the latest committed version.
    pub fn snapshot(self: &Arc<Self>) -> Result<ReadSnapshot, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(ReadSnapshot::new(Arc::clone(self)))
    }

    fn commit(&self, txn: WriteTxn) -> Result<u64, StoreError> {
        if txn.is_empty() {
            return Ok(self.version());
        }

        let mut log = self.log.lock();
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let version = self.version.load(Ordering::Acquire) + 1;
        let record = LogRecord::new(version, now_micros(), txn.into_entries());
        let location = log.append(&record)?;
        let keep_from = self.prune_horizon();

        let mut index = self.index.write();
        for (key, value) in record.entries {
            let entry = VersionedEntry {
                version,
                value: Arc::from(value),
                location,
            };
            match index.get_mut(key.as_slice()) {
                Some(chain) => {
                    if let Some(old) = chain.push(entry) {
                        log.add_discard(old.location.segment, entry_size(&key, &old.value));
                    }
                    chain.prune(keep_from);
                }
                None => {
                    index.insert(key, VersionChain::new(entry));
                }
            }
        }
        drop(index);

        self.version.store(version, Ordering::Release);
        debug!(target: "vectext::store", version, "Committed transaction");
        Ok(version)
    }

    /// Reclaim space from the sealed segment with the highest discard ratio,
    /// provided that ratio is at least `discard_ratio`.
    ///
    /// Returns `Ok(true)` if a segment was rewritten and deleted, `Ok(false)`
    /// if no segment qualified.
    pub fn reclaim(&self, discard_ratio: f64) -> Result<bool, StoreError> {
        if !(discard_ratio > 0.0 && discard_ratio < 1.0) {
            return Err(StoreError::InvalidReclaimRatio(discard_ratio));
        }

        let mut log = self.log.lock();
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let Some(candidate) = log.pick_candidate(discard_ratio) else {
            debug!(target: "vectext::store", discard_ratio, "No segment eligible for reclamation");
            return Ok(false);
        };

        let (_, body) = Segment::read_all(&Segment::segment_path(&self.dir, candidate))?;
        let live = self.live_records(candidate, &body)?;

        let mut moved = 0usize;
        for record in &live {
            let location = log.append(record)?;
            let mut index = self.index.write();
            for (key, _) in &record.entries {
                if let Some(entry) = index
                    .get_mut(key.as_slice())
                    .and_then(|chain| chain.entry_mut(record.version))
                {
                    entry.location = location;
                }
                moved += 1;
            }
        }
        log.sync()?;
        let freed = log.remove_segment(candidate)?;

        info!(
            target: "vectext::store",
            segment = candidate,
            entries_moved = moved,
            bytes_freed = freed,
            "Reclaimed value log segment"
        );
        Ok(true)
    }

    /// Entries of `segment` that are still the latest version of their key,
    /// grouped by their original commit.
    fn live_records(&self, segment: u64, body: &[u8]) -> Result<Vec<LogRecord>, StoreError> {
        let index = self.index.read();
        let mut live = Vec::new();
        let mut offset = 0usize;
        while offset < body.len() {
            let (record, consumed) = LogRecord::from_bytes(&body[offset..]).map_err(|e| {
                StoreError::corruption(format!("segment {} offset {}: {}", segment, offset, e))
            })?;
            let location = ValueLocation {
                segment,
                offset: (SEGMENT_HEADER_SIZE + offset) as u64,
            };
            let version = record.version;
            let entries: Vec<_> = record
                .entries
                .into_iter()
                .filter(|(key, _)| {
                    index
                        .get(key.as_slice())
                        .and_then(VersionChain::latest)
                        .map_or(false, |l| l.version == version && l.location == location)
                })
                .collect();
            if !entries.is_empty() {
                live.push(LogRecord::new(version, record.timestamp, entries));
            }
            offset += consumed;
        }
        Ok(live)
    }

    /// Flush and stop accepting operations. Idempotent.
    pub fn close(&self) -> Result<(), StoreError> {
        let mut log = self.log.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        log.sync()?;
        info!(target: "vectext::store", path = ?self.dir, version = self.version(), "Store closed");
        Ok(())
    }

    /// Current statistics
    pub fn stats(&self) -> StoreStats {
        let log = self.log.lock();
        let totals = log.totals();
        StoreStats {
            version: self.version(),
            keys: self.index.read().len(),
            segments: log.segment_count(),
            total_bytes: totals.total_bytes,
            discard_bytes: totals.discard_bytes,
        }
    }

    // ========================================================================
    // Snapshot support
    // ========================================================================

    pub(crate) fn register_snapshot(&self) -> u64 {
        let mut snapshots = self.snapshots.lock();
        let version = self.version.load(Ordering::Acquire);
        *snapshots.entry(version).or_insert(0) += 1;
        version
    }

    pub(crate) fn retain_snapshot(&self, version: u64) {
        *self.snapshots.lock().entry(version).or_insert(0) += 1;
    }

    pub(crate) fn release_snapshot(&self, version: u64) {
        let mut snapshots = self.snapshots.lock();
        if let Some(count) = snapshots.get_mut(&version) {
            *count -= 1;
            if *count == 0 {
                snapshots.remove(&version);
            }
        }
    }

    /// Oldest version any current or future reader can observe
    fn prune_horizon(&self) -> u64 {
        let snapshots = self.snapshots.lock();
        let published = self.version.load(Ordering::Acquire);
        snapshots
            .keys()
            .next()
            .map_or(published, |&oldest| oldest.min(published))
    }

    pub(crate) fn read_at(&self, key: &[u8], version: u64) -> Option<Arc<[u8]>> {
        self.index
            .read()
            .get(key)
            .and_then(|chain| chain.get_at_version(version))
            .map(|entry| Arc::clone(&entry.value))
    }

    /// First key after `after` with a value visible at `version`
    pub(crate) fn next_visible(
        &self,
        after: Option<&[u8]>,
        version: u64,
        prefetch_values: bool,
    ) -> Option<Item> {
        let lower = match after {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        let index = self.index.read();
        index
            .range::<[u8], _>((lower, Bound::Unbounded))
            .find_map(|(key, chain)| {
                chain.get_at_version(version).map(|entry| {
                    Item::new(
                        key.clone(),
                        entry.version,
                        prefetch_values.then(|| Arc::clone(&entry.value)),
                    )
                })
            })
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Err(e) = self.log.get_mut().sync() {
            warn!(target: "vectext::store", error = %e, "Failed to sync value log on drop");
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("dir", &self.dir)
            .field("version", &self.version())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================================================
// Replay
// ============================================================================

struct Replayed {
    index: BTreeMap<Vec<u8>, VersionChain>,
    stats: BTreeMap<u64, SegmentStats>,
    store_uuid: Option<[u8; 16]>,
    max_version: u64,
    records: usize,
    /// Last segment and the end of its last intact record
    tail: Option<(u64, u64)>,
}

fn replay(dir: &Path) -> Result<Replayed, StoreError> {
    let segments = Segment::list(dir)?;
    let mut out = Replayed {
        index: BTreeMap::new(),
        stats: BTreeMap::new(),
        store_uuid: None,
        max_version: 0,
        records: 0,
        tail: None,
    };

    for (i, &segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        let path = Segment::segment_path(dir, segment);
        let (header, body) = match Segment::read_all(&path) {
            Ok((header, body)) if is_last && !header.is_valid() && body.is_empty() => {
                remove_torn_segment(&path, segment)?;
                break;
            }
            Ok(read) => read,
            Err(e) if is_last && e.kind() == std::io::ErrorKind::UnexpectedEof => {
                remove_torn_segment(&path, segment)?;
                break;
            }
            Err(e) => {
                return Err(StoreError::corruption(format!(
                    "unreadable segment {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if !header.is_valid() || header.segment_number != segment {
            return Err(StoreError::corruption(format!(
                "invalid header in segment {}",
                path.display()
            )));
        }
        match out.store_uuid {
            None => out.store_uuid = Some(header.store_uuid),
            Some(uuid) if uuid != header.store_uuid => {
                return Err(StoreError::corruption(format!(
                    "segment {} belongs to a different store",
                    path.display()
                )));
            }
            Some(_) => {}
        }

        out.stats.insert(segment, SegmentStats::default());
        let mut offset = 0usize;
        while offset < body.len() {
            match LogRecord::from_bytes(&body[offset..]) {
                Ok((record, consumed)) => {
                    let location = ValueLocation {
                        segment,
                        offset: (SEGMENT_HEADER_SIZE + offset) as u64,
                    };
                    apply_replayed(&mut out, record, location);
                    out.records += 1;
                    offset += consumed;
                }
                Err(e) if is_last => {
                    warn!(
                        target: "vectext::store",
                        segment,
                        offset,
                        discarded = body.len() - offset,
                        error = %e,
                        "Truncating torn tail of value log"
                    );
                    break;
                }
                Err(e) => {
                    return Err(StoreError::corruption(format!(
                        "segment {} offset {}: {}",
                        segment, offset, e
                    )));
                }
            }
        }

        out.tail = Some((segment, (SEGMENT_HEADER_SIZE + offset) as u64));
    }

    Ok(out)
}

/// Delete a last segment whose header never reached disk.
fn remove_torn_segment(path: &Path, segment: u64) -> Result<(), StoreError> {
    warn!(
        target: "vectext::store",
        segment,
        path = ?path,
        "Removing value log segment with a torn header"
    );
    std::fs::remove_file(path)?;
    Ok(())
}

/// Apply one replayed record: the highest version of each key wins.
fn apply_replayed(out: &mut Replayed, record: LogRecord, location: ValueLocation) {
    out.max_version = out.max_version.max(record.version);
    for (key, value) in record.entries {
        let size = entry_size(&key, &value);
        if let Some(stats) = out.stats.get_mut(&location.segment) {
            stats.total_bytes += size;
        }

        let existing = out
            .index
            .get(key.as_slice())
            .and_then(VersionChain::latest)
            .map(|l| (l.version, l.location.segment, entry_size(&key, &l.value)));

        let discarded = match existing {
            // Copy left behind by an interrupted reclamation
            Some((version, _, _)) if version >= record.version => {
                if let Some(stats) = out.stats.get_mut(&location.segment) {
                    stats.discard_bytes += size;
                }
                continue;
            }
            Some((_, segment, bytes)) => Some((segment, bytes)),
            None => None,
        };
        if let Some((segment, bytes)) = discarded {
            if let Some(stats) = out.stats.get_mut(&segment) {
                stats.discard_bytes += bytes;
            }
        }

        let entry = VersionedEntry {
            version: record.version,
            value: Arc::from(value),
            location,
        };
        out.index.insert(key, VersionChain::new(entry));
    }
}

/// Current time in microseconds since the Unix epoch
fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
