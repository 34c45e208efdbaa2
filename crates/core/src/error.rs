//! Error types for vectext
//!
//! This module defines the error taxonomy shared by every layer:
//! - `Error`: what the writer, scanner, ranker and resolver return
//! - `StoreError`: failures raised by the key-value engine
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vectext operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by an embedding provider
pub type ProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for the vectext core
#[derive(Debug, Error)]
pub enum Error {
    /// Vector cannot be serialized into a key (e.g. it is empty)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Stored key or value cannot be turned back into a record
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Failure reported by the underlying key-value engine
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Failure reported by the embedding provider
    #[error("Provider error: {0}")]
    Provider(#[source] ProviderError),

    /// Nothing to rank, or a re-encoded key is missing from the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration file could not be read, parsed or validated
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Error::Encoding(msg.into())
    }

    /// Create a decoding error
    pub fn decoding(msg: impl Into<String>) -> Self {
        Error::Decoding(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Wrap any provider failure
    pub fn provider(err: impl Into<ProviderError>) -> Self {
        Error::Provider(err.into())
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Errors raised by the key-value engine
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error on a store file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// On-disk data failed validation
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// The store was closed before the operation ran
    #[error("Store is closed")]
    Closed,

    /// Keys must contain at least one byte
    #[error("Key cannot be empty")]
    EmptyKey,

    /// Reclaim threshold outside the open interval (0, 1)
    #[error("Invalid reclaim ratio {0}: must be between 0 and 1 (exclusive)")]
    InvalidReclaimRatio(f64),

    /// Another process holds the directory lock
    #[error("Store at '{}' is already in use by another process", .0.display())]
    Locked(PathBuf),

    /// Store options failed validation
    #[error("Invalid store options: {0}")]
    InvalidOptions(String),
}

impl StoreError {
    /// Create a corruption error
    pub fn corruption(msg: impl Into<String>) -> Self {
        StoreError::Corruption(msg.into())
    }
}
