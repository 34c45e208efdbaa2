//! Core types and traits for vectext
//!
//! This crate defines the foundational pieces used throughout the system:
//! - Vector codec: lossless `f64` vector <-> fixed-width key bytes
//! - Data types: EmbeddingVector, TextRecord, Ranked
//! - Error: Error and StoreError taxonomy
//! - Traits: EmbeddingProvider, PoolingMode
//! - HashingEmbedder: deterministic built-in provider

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod embed;
pub mod error;
pub mod traits;
pub mod types;

pub use codec::{decode_vector, decode_vector_with_dimension, encode_vector, encoded_dimension};
pub use embed::HashingEmbedder;
pub use error::{Error, ProviderError, Result, StoreError};
pub use traits::{EmbeddingProvider, PoolingMode};
pub use types::{EmbeddingVector, Ranked, TextRecord};
