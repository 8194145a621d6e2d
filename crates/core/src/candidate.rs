use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A candidate entity to be scored: an opaque identifier plus its
/// feature vector. Identifiers are never interpreted; input order only
/// matters as the tie-break order during ranking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Candidate {
    pub id: String,
    pub vector: Vec<f64>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, vector: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            vector,
        }
    }
}

/// A candidate after filtering, sorting, and truncation.
///
/// `rank` is dense and 1-based, assigned only in the final ranked order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoredCandidate {
    pub id: String,
    /// Cosine similarity to the query, in [-1, 1].
    pub similarity: f64,
    pub rank: usize,
}

/// A member of a similarity cluster.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMember {
    pub id: String,
    /// Dot product of the member's vector with the unit-normalized
    /// centroid. Equals true cosine similarity when the input vectors
    /// are unit-normalized upstream.
    pub similarity_to_centroid: f64,
}

/// A cohesive group of candidates around a shared centroid.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cluster {
    /// Unit-normalized centroid vector.
    pub centroid: Vec<f64>,
    /// Members sorted by similarity to the centroid, descending.
    pub members: Vec<ClusterMember>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
