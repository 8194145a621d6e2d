//! Cosine similarity scoring: one query vector against a batch of
//! candidate vectors.

use affinity_core::AffinityError;

use crate::normalize::{dot, norm, normalize};

/// Cosine similarity between a single query/candidate pair:
/// `(A·B) / (‖A‖‖B‖)`, in [-1, 1].
///
/// Returns 0.0 when either vector has zero norm — a zero vector is
/// "similar to nothing" by convention, never an error.
pub fn score_single(query: &[f64], candidate: &[f64]) -> f64 {
    let qn = norm(query);
    let cn = norm(candidate);
    if qn == 0.0 || cn == 0.0 {
        return 0.0;
    }
    dot(query, candidate) / (qn * cn)
}

/// Score every candidate against the query in one pass.
///
/// Every candidate must have the query's dimension; the first offender is
/// reported by position via [`AffinityError::DimensionMismatch`]. The
/// result is element-wise equal to [`score_single`] for each candidate.
pub fn score_batch<V: AsRef<[f64]>>(
    query: &[f64],
    candidates: &[V],
) -> Result<Vec<f64>, AffinityError> {
    let expected = query.len();
    for (index, candidate) in candidates.iter().enumerate() {
        let actual = candidate.as_ref().len();
        if actual != expected {
            return Err(AffinityError::DimensionMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    // Zero-norm query: cosine with anything is 0, skip the arithmetic.
    if norm(query) == 0.0 {
        return Ok(vec![0.0; candidates.len()]);
    }

    let unit_query = normalize(query);
    Ok(candidates
        .iter()
        .map(|candidate| dot(&normalize(candidate.as_ref()), &unit_query))
        .collect())
}
