//! Nearest-neighbor resolution
//!
//! Embeds a query, ranks every stored vector against it, and resolves the
//! best vector back to its text with a point lookup.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, error};
use vectext_core::{
    encode_vector, EmbeddingProvider, EmbeddingVector, Error, PoolingMode, Ranked, Result,
};
use vectext_storage::Store;

use crate::ranker::rank;
use crate::scanner::scan_vectors;

/// Number of vector components shown per rank in reports
pub const PREVIEW_COMPONENTS: usize = 4;

/// The text closest to a query, with the full ranking behind it
#[derive(Debug, Clone)]
pub struct Nearest {
    /// Text stored under the best-ranked vector
    pub text: String,
    /// Every stored vector, best first
    pub ranked: Vec<Ranked>,
}

impl Nearest {
    /// Best-ranked entry
    pub fn best(&self) -> Option<&Ranked> {
        self.ranked.first()
    }

    /// Human-readable ranking: one line per rank, up to `limit` ranks.
    ///
    /// Each line shows the score and the first few vector components.
    pub fn report(&self, limit: usize) -> String {
        let mut out = String::new();
        for (i, r) in self.ranked.iter().take(limit).enumerate() {
            let _ = writeln!(
                out,
                "rank {:>3}  score {:>9.6}  {:?}",
                i + 1,
                r.score,
                r.preview(PREVIEW_COMPONENTS)
            );
        }
        out
    }
}

/// Find the stored text nearest to `query_text`.
///
/// # Errors
///
/// - `Error::Provider` if the query cannot be embedded
/// - `Error::NotFound` if the store holds no records
/// - `Error::Decoding` if a stored key does not match the query's dimension
/// - `Error::Store` on engine failure
pub fn find_nearest<P>(
    store: &Arc<Store>,
    provider: &P,
    pooling: PoolingMode,
    query_text: &str,
) -> Result<Nearest>
where
    P: EmbeddingProvider + ?Sized,
{
    let query = provider
        .embed(query_text, pooling)
        .map_err(Error::provider)?;
    debug!(
        target: "vectext::resolver",
        dimension = query.len(),
        pooling = %pooling,
        "Embedded query"
    );
    find_nearest_to_vector(store, &query)
}

/// Find the stored text nearest to a caller-supplied vector.
pub fn find_nearest_to_vector(store: &Arc<Store>, query: &[f64]) -> Result<Nearest> {
    let candidates = scan_vectors(store, Some(query.len()))?
        .collect::<Result<Vec<EmbeddingVector>>>()?;

    let ranked = rank(query, candidates)?;
    let Some(best) = ranked.first() else {
        return Err(Error::not_found("store holds no records"));
    };
    debug!(
        target: "vectext::resolver",
        candidates = ranked.len(),
        score = best.score,
        "Ranked candidates"
    );

    let key = encode_vector(&best.vector)?;
    let value = store.view(|snapshot| snapshot.get(&key))?;
    let Some(value) = value else {
        error!(
            target: "vectext::resolver",
            preview = ?best.preview(PREVIEW_COMPONENTS),
            "Top-ranked vector does not round-trip to a stored key"
        );
        return Err(Error::not_found(
            "top-ranked vector has no stored record (key round-trip failed)",
        ));
    };

    let text = String::from_utf8(value)
        .map_err(|e| Error::decoding(format!("stored text is not valid UTF-8: {}", e)))?;
    Ok(Nearest { text, ranked })
}
