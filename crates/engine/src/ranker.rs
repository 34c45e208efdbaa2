//! Similarity ranking
//!
//! Scores every candidate against the query with cosine similarity and
//! orders them best first. This is a linear scan: O(corpus × dimension) per
//! query, with no index built. It is meant for small corpora.
//!
//! Scores are "higher = more similar". Vectors are used as-is, with no
//! implicit normalization.

use std::cmp::Ordering;

use vectext_core::{EmbeddingVector, Error, Ranked, Result};

/// Cosine similarity: dot(a,b) / (||a|| * ||b||)
///
/// Range: [-1, 1], higher = more similar. The two norms are computed
/// independently, each over its vector divided by its largest absolute
/// component, so very small or very large components neither underflow nor
/// overflow.
///
/// Returns `f64::NAN` if either vector is all zeros; `rank` orders such
/// scores after every numeric score. Lengths are expected to match; extra
/// components of the longer slice are ignored.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let scale_a = max_abs(a);
    let scale_b = max_abs(b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return f64::NAN;
    }
    if !scale_a.is_finite() || !scale_b.is_finite() {
        return dot_product(a, b) / l2_norm(a) / l2_norm(b);
    }

    let a: Vec<f64> = a.iter().map(|x| x / scale_a).collect();
    let b: Vec<f64> = b.iter().map(|x| x / scale_b).collect();
    dot_product(&a, &b) / (l2_norm(&a) * l2_norm(&b))
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m: f64, x| m.max(x.abs()))
}

fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Score and sort `candidates` against `query`, best first.
///
/// The sort is stable, so equal scores keep candidate order. NaN scores go
/// last. A candidate whose dimension differs from the query's fails with
/// `Error::Decoding`.
pub fn rank<I>(query: &[f64], candidates: I) -> Result<Vec<Ranked>>
where
    I: IntoIterator<Item = EmbeddingVector>,
{
    let mut ranked = Vec::new();
    for (position, vector) in candidates.into_iter().enumerate() {
        if vector.len() != query.len() {
            return Err(Error::decoding(format!(
                "candidate {} has dimension {}, query has {}",
                position,
                vector.len(),
                query.len()
            )));
        }
        let score = cosine_similarity(query, &vector);
        ranked.push(Ranked::new(score, vector));
    }

    ranked.sort_by(|a, b| descending_nan_last(a.score, b.score));
    Ok(ranked)
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
