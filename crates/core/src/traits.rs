//! Trait definitions for external collaborators
//!
//! The embedding model lives outside this crate. Anything that can turn text
//! into a fixed-dimension vector plugs in through [`EmbeddingProvider`].

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::types::EmbeddingVector;

/// How token-level embeddings are pooled into one sentence vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolingMode {
    /// Average of all token vectors
    #[default]
    Mean,
    /// Component-wise maximum over all token vectors
    Max,
    /// Vector of the first token only
    Cls,
}

impl PoolingMode {
    /// Name used in configuration files and log lines
    pub fn name(&self) -> &'static str {
        match self {
            PoolingMode::Mean => "mean",
            PoolingMode::Max => "max",
            PoolingMode::Cls => "cls",
        }
    }
}

impl std::fmt::Display for PoolingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Source of embedding vectors
///
/// Implementations must be deterministic: the same text and pooling mode
/// always produce the same vector, and every vector has `dimension()`
/// components.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a text fragment
    fn embed(&self, text: &str, pooling: PoolingMode) -> Result<EmbeddingVector, ProviderError>;

    /// Dimension of every vector this provider returns
    fn dimension(&self) -> usize;
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for std::sync::Arc<P> {
    fn embed(&self, text: &str, pooling: PoolingMode) -> Result<EmbeddingVector, ProviderError> {
        (**self).embed(text, pooling)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}
