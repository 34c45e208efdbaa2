//! Record writer
//!
//! Persists (text, vector) pairs as store records: the encoded vector is
//! the key and the raw UTF-8 text is the value. A batch is written in a
//! single transaction, so it lands completely or not at all.
//!
//! The vector is the only key. Two texts whose embeddings are bit-identical
//! map to the same record and the later write silently replaces the earlier
//! one, both within a batch and across batches.

use tracing::{debug, info};
use vectext_core::{encode_vector, EmbeddingProvider, Error, PoolingMode, Result};
use vectext_storage::Store;

/// Write every pair in one transaction.
///
/// The first pair that fails to encode (or to be staged) aborts the whole
/// transaction: nothing is committed and that error is returned.
///
/// Returns the number of pairs written.
pub fn insert_batch<I, T, V>(store: &Store, pairs: I) -> Result<usize>
where
    I: IntoIterator<Item = (T, V)>,
    T: AsRef<str>,
    V: AsRef<[f64]>,
{
    let count = store.update(|txn| {
        let mut count = 0usize;
        for (text, vector) in pairs {
            let key = encode_vector(vector.as_ref())?;
            txn.set(key, text.as_ref().as_bytes())?;
            count += 1;
        }
        Ok::<_, Error>(count)
    })?;

    info!(target: "vectext::db", records = count, version = store.version(), "Inserted batch");
    Ok(count)
}

/// Embed every text, then write the batch.
///
/// All texts are embedded before the transaction opens; a provider failure
/// leaves the store untouched.
pub fn insert_texts<I, T, P>(
    store: &Store,
    provider: &P,
    pooling: PoolingMode,
    texts: I,
) -> Result<usize>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
    P: EmbeddingProvider + ?Sized,
{
    let mut pairs = Vec::new();
    for text in texts {
        let vector = provider
            .embed(text.as_ref(), pooling)
            .map_err(Error::provider)?;
        debug!(
            target: "vectext::db",
            dimension = vector.len(),
            preview = ?&vector[..vector.len().min(3)],
            "Embedded text"
        );
        pairs.push((text, vector));
    }
    insert_batch(store, pairs)
}
