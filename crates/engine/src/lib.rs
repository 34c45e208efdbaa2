//! Database engine for vectext
//!
//! This crate builds the text store on top of the storage layer:
//! - Writer: batch insertion of (text, vector) records
//! - Scanner: full decode scans over a read snapshot
//! - Ranker: cosine similarity and stable descending ranking
//! - Resolver: nearest stored text for a query
//! - Maintenance: background value log reclamation
//! - Database: config, lifecycle and the operations above in one handle

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod demo;
pub mod maintenance;
pub mod ranker;
pub mod resolver;
pub mod scanner;
pub mod writer;

pub use database::{Database, MaintenanceSettings, VectextConfig, CONFIG_FILE_NAME};
pub use maintenance::{
    run_reclaim_cycle, MaintenanceConfig, MaintenanceHandle, MaintenanceTask, ReclaimOutcome,
};
pub use ranker::{cosine_similarity, rank};
pub use resolver::{find_nearest, find_nearest_to_vector, Nearest};
pub use scanner::{scan_all, scan_vectors, RecordScan, VectorScan};
pub use writer::{insert_batch, insert_texts};
