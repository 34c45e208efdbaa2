//! Value log: the set of segments backing a store
//!
//! The last segment is active (appendable); every earlier segment is sealed.
//! Each segment tracks how many of its entry bytes are still live and how
//! many have been superseded by newer versions ("discard" bytes). Space
//! reclamation rewrites the sealed segment with the most garbage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::format::{entry_size, LogRecord, Segment};
use crate::index::ValueLocation;
use crate::options::StoreOptions;

/// Byte accounting for one segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStats {
    /// Entry bytes ever written to the segment
    pub total_bytes: u64,
    /// Entry bytes superseded by newer versions
    pub discard_bytes: u64,
}

impl SegmentStats {
    /// Fraction of the segment's entry bytes that are garbage
    pub fn discard_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.discard_bytes as f64 / self.total_bytes as f64
        }
    }
}

pub(crate) struct ValueLog {
    dir: PathBuf,
    store_uuid: [u8; 16],
    options: StoreOptions,
    active: Segment,
    /// Stats for every segment on disk, active included
    stats: BTreeMap<u64, SegmentStats>,
}

impl ValueLog {
    pub(crate) fn new(
        dir: &Path,
        store_uuid: [u8; 16],
        options: StoreOptions,
        active: Segment,
        stats: BTreeMap<u64, SegmentStats>,
    ) -> Self {
        let mut stats = stats;
        stats.entry(active.segment_number()).or_default();
        ValueLog {
            dir: dir.to_path_buf(),
            store_uuid,
            options,
            active,
            stats,
        }
    }

    /// Append a record to the active segment, rotating first if it is full.
    pub(crate) fn append(&mut self, record: &LogRecord) -> std::io::Result<ValueLocation> {
        if self.active.size() >= self.options.segment_size {
            self.rotate()?;
        }

        let offset = self
            .active
            .append(&record.to_bytes(), self.options.sync_writes)?;

        let segment = self.active.segment_number();
        let written: u64 = record.entries.iter().map(|(k, v)| entry_size(k, v)).sum();
        self.stats.entry(segment).or_default().total_bytes += written;

        Ok(ValueLocation { segment, offset })
    }

    /// Make the next append to the active segment fail.
    #[cfg(test)]
    pub(crate) fn inject_fault(&mut self, fault: crate::format::segment::Fault) {
        self.active.inject_fault(fault);
    }

    fn rotate(&mut self) -> std::io::Result<()> {
        self.active.sync()?;
        let next = self.active.segment_number() + 1;
        self.active = Segment::create(&self.dir, next, self.store_uuid)?;
        self.stats.insert(next, SegmentStats::default());
        tracing::debug!(target: "vectext::store", segment = next, "Started new value log segment");
        Ok(())
    }

    /// Record that `bytes` of `segment` were superseded.
    pub(crate) fn add_discard(&mut self, segment: u64, bytes: u64) {
        if let Some(stats) = self.stats.get_mut(&segment) {
            stats.discard_bytes += bytes;
        }
    }

    /// Sealed segment with the highest discard ratio at or above `threshold`.
    pub(crate) fn pick_candidate(&self, threshold: f64) -> Option<u64> {
        let active = self.active.segment_number();
        self.stats
            .iter()
            .filter(|(n, s)| **n != active && s.total_bytes > 0 && s.discard_ratio() >= threshold)
            .max_by(|(na, a), (nb, b)| {
                a.discard_ratio()
                    .total_cmp(&b.discard_ratio())
                    // Prefer the oldest segment on equal ratios
                    .then_with(|| nb.cmp(na))
            })
            .map(|(n, _)| *n)
    }

    /// Delete a sealed segment file. Returns the bytes freed on disk.
    pub(crate) fn remove_segment(&mut self, segment: u64) -> std::io::Result<u64> {
        let path = Segment::segment_path(&self.dir, segment);
        let freed = std::fs::metadata(&path)?.len();
        std::fs::remove_file(&path)?;
        self.stats.remove(&segment);
        Ok(freed)
    }

    pub(crate) fn sync(&mut self) -> std::io::Result<()> {
        self.active.sync()
    }

    pub(crate) fn segment_count(&self) -> usize {
        self.stats.len()
    }

    pub(crate) fn totals(&self) -> SegmentStats {
        self.stats.values().fold(SegmentStats::default(), |acc, s| SegmentStats {
            total_bytes: acc.total_bytes + s.total_bytes,
            discard_bytes: acc.discard_bytes + s.discard_bytes,
        })
    }

    pub(crate) fn active_segment(&self) -> u64 {
        self.active.segment_number()
    }
}
