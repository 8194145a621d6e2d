//! Threshold filtering, stable ranking, and top-K truncation.

use std::cmp::Ordering;

use affinity_core::{AffinityError, Candidate, ScoredCandidate};

use crate::similarity::score_batch;

/// Score `candidates` against `query`, keep those at or above
/// `min_similarity`, sort descending, and return the `top_k` best with
/// dense 1-based ranks.
///
/// Ties keep the original input order (stable sort), so the result is
/// reproducible for identical input. An empty candidate slice or
/// `top_k == 0` yields an empty result, not an error.
pub fn select_top_k(
    query: &[f64],
    candidates: &[Candidate],
    top_k: usize,
    min_similarity: f64,
) -> Result<Vec<ScoredCandidate>, AffinityError> {
    let vectors: Vec<&[f64]> = candidates.iter().map(|c| c.vector.as_slice()).collect();
    let similarities = score_batch(query, &vectors)?;

    let mut passing: Vec<(usize, f64)> = similarities
        .into_iter()
        .enumerate()
        .filter(|(_, similarity)| *similarity >= min_similarity)
        .collect();

    // Stable sort: equal similarities preserve input order.
    passing.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    passing.truncate(top_k);

    Ok(passing
        .into_iter()
        .enumerate()
        .map(|(position, (index, similarity))| ScoredCandidate {
            id: candidates[index].id.clone(),
            similarity,
            rank: position + 1,
        })
        .collect())
}
