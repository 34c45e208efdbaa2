//! Core data types
//!
//! - `EmbeddingVector`: the fixed-dimension vector produced by a provider
//! - `TextRecord`: a decoded (vector, text) pair read back from the store
//! - `Ranked`: a similarity score attached to a candidate vector

use serde::{Deserialize, Serialize};

/// An embedding vector.
///
/// All vectors persisted in one store must share the same dimension.
pub type EmbeddingVector = Vec<f64>;

/// A stored record decoded from the store
///
/// The vector is recovered from the record's key; the text is the record's
/// value. Records are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    /// Vector decoded from the record key
    pub vector: EmbeddingVector,
    /// Text stored as the record value
    pub text: String,
}

impl TextRecord {
    /// Create a new record
    pub fn new(vector: EmbeddingVector, text: impl Into<String>) -> Self {
        Self {
            vector,
            text: text.into(),
        }
    }

    /// Dimension of the record's vector
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A candidate vector and its similarity to a query
///
/// Produced per query by the ranker; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    /// Cosine similarity to the query (`NaN` when undefined)
    pub score: f64,
    /// The candidate vector
    pub vector: EmbeddingVector,
}

impl Ranked {
    /// Create a new ranked entry
    pub fn new(score: f64, vector: EmbeddingVector) -> Self {
        Self { score, vector }
    }

    /// The first `n` components of the vector, for log lines and reports
    pub fn preview(&self, n: usize) -> &[f64] {
        &self.vector[..n.min(self.vector.len())]
    }
}
