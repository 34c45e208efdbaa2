//! Feature-hashing embedder
//!
//! A deterministic, dependency-free stand-in for a sentence-embedding model.
//! Each lowercase word token is hashed (xxh3, several seeds) onto signed
//! positions of a fixed-dimension vector; token vectors are then pooled.
//! Texts sharing many words end up with a high cosine similarity.
//!
//! This is a bag-of-words approximation, not a semantic model.

use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::error::ProviderError;
use crate::traits::{EmbeddingProvider, PoolingMode};
use crate::types::EmbeddingVector;

/// Default output dimension, matching common MiniLM-class sentence models
pub const DEFAULT_DIMENSION: usize = 384;

/// Number of hashed positions each token writes to
const PROBES_PER_TOKEN: u64 = 4;

/// Deterministic hashing embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimension` components.
    ///
    /// A dimension of zero is raised to one.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }

    fn token_vector(&self, token: &str) -> EmbeddingVector {
        let mut v = vec![0.0; self.dimension];
        for probe in 0..PROBES_PER_TOKEN {
            let h = xxh3_64_with_seed(token.as_bytes(), probe);
            let index = (h % self.dimension as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[index] += sign;
        }
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str, pooling: PoolingMode) -> Result<EmbeddingVector, ProviderError> {
        let mut token_vectors = Self::tokens(text).map(|t| self.token_vector(&t));

        let first = token_vectors
            .next()
            .ok_or_else(|| format!("text {:?} contains no tokens to embed", text))?;

        let pooled = match pooling {
            PoolingMode::Cls => first,
            PoolingMode::Mean => {
                let mut sum = first;
                let mut count = 1usize;
                for tv in token_vectors {
                    for (acc, x) in sum.iter_mut().zip(tv) {
                        *acc += x;
                    }
                    count += 1;
                }
                sum.iter_mut().for_each(|x| *x /= count as f64);
                sum
            }
            PoolingMode::Max => token_vectors.fold(first, |mut acc, tv| {
                for (a, x) in acc.iter_mut().zip(tv) {
                    *a = a.max(x);
                }
                acc
            }),
        };
        Ok(pooled)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f64], b: &[f64]) -> f64 {
        let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        let nb: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
        dot / (na * nb)
    }

    #[test]
    fn test_dimension() {
        let e = HashingEmbedder::new(64);
        let v = e.embed("hello world", PoolingMode::Mean).unwrap();
        assert_eq!(v.len(), 64);
        assert_eq!(e.dimension(), 64);
    }

    #[test]
    fn test_zero_dimension_is_raised() {
        assert_eq!(HashingEmbedder::new(0).dimension(), 1);
    }

    #[test]
    fn test_deterministic() {
        let e = HashingEmbedder::default();
        let a = e.embed("The quick brown fox", PoolingMode::Mean).unwrap();
        let b = e.embed("The quick brown fox", PoolingMode::Mean).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let e = HashingEmbedder::default();
        let a = e.embed("Hello, world!", PoolingMode::Mean).unwrap();
        let b = e.embed("hello world", PoolingMode::Mean).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shared_words_are_closer() {
        let e = HashingEmbedder::default();
        let a = e.embed("lorem ipsum dolor sit amet", PoolingMode::Mean).unwrap();
        let b = e.embed("lorem ipsum dolor sit", PoolingMode::Mean).unwrap();
        let c = e.embed("engage the hyperdrive now", PoolingMode::Mean).unwrap();
        assert!(cosine(&a, &b) > cosine(&a, &c));
    }

    #[test]
    fn test_empty_text_is_error() {
        let e = HashingEmbedder::default();
        assert!(e.embed("   ...  ", PoolingMode::Mean).is_err());
    }

    #[test]
    fn test_cls_uses_first_token() {
        let e = HashingEmbedder::new(32);
        let cls = e.embed("alpha beta gamma", PoolingMode::Cls).unwrap();
        let alpha = e.embed("alpha", PoolingMode::Mean).unwrap();
        assert_eq!(cls, alpha);
    }

    #[test]
    fn test_max_pooling_dominates_mean() {
        let e = HashingEmbedder::new(32);
        let max = e.embed("alpha beta gamma", PoolingMode::Max).unwrap();
        let mean = e.embed("alpha beta gamma", PoolingMode::Mean).unwrap();
        for (m, a) in max.iter().zip(mean.iter()) {
            assert!(m >= a);
        }
    }
}
