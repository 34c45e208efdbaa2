//! Storage layer for vectext
//!
//! This crate implements the embedded key-value store the engine persists
//! records in:
//! - Store: ordered keys, atomic write transactions, MVCC read snapshots
//! - Value log: append-only checksummed segments, replayed on open
//! - Space reclamation driven by per-segment discard accounting
//! - Exclusive directory lock preventing concurrent process access

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod index;
pub mod options;
pub mod snapshot;
pub mod store;
pub mod transaction;
mod vlog;

pub use options::StoreOptions;
pub use snapshot::{IteratorOptions, Item, ReadSnapshot, SnapshotIter};
pub use store::{Store, StoreStats};
pub use transaction::WriteTxn;
pub use vlog::SegmentStats;
