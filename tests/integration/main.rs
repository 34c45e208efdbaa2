//! Integration Tests
//!
//! Cross-crate tests through the `vectext` facade:
//! - Pipeline: ingest, scan, rank and resolve
//! - Durability: reopen and config persistence
//! - Reclamation: value log space recovery under overwrites
//! - Concurrency: readers and maintenance alongside writers

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod durability;
mod pipeline;
mod reclamation;
