//! vectext - embedded text store keyed by embedding vectors
//!
//! Each text fragment is stored under the byte encoding of its embedding
//! vector. Queries embed the query text, rank every stored vector by cosine
//! similarity and resolve the best one back to its text.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use vectext::{Database, HashingEmbedder};
//!
//! let db = Database::open("./my-db", Arc::new(HashingEmbedder::default()))?;
//! db.insert_texts(["Lorem ipsum dolor sit amet.", "Hello, world!"])?;
//!
//! let nearest = db.find_nearest("A commonly used latin phrase")?;
//! println!("{}", nearest.text);
//! ```
//!
//! # Architecture
//!
//! - `vectext-core`: vector codec, record types, errors, provider trait
//! - `vectext-storage`: versioned key-value store over a segmented value log
//! - `vectext-engine`: writer, scanner, ranker, resolver, maintenance, `Database`

pub use vectext_core::*;
pub use vectext_engine::{
    cosine_similarity, demo, find_nearest, find_nearest_to_vector, insert_batch, insert_texts,
    rank, run_reclaim_cycle, scan_all, scan_vectors, Database, MaintenanceConfig,
    MaintenanceHandle, MaintenanceSettings, MaintenanceTask, Nearest, ReclaimOutcome, RecordScan,
    VectextConfig, VectorScan, CONFIG_FILE_NAME,
};
pub use vectext_storage::{ReadSnapshot, Store, StoreOptions, StoreStats, WriteTxn};
