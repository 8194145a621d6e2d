//! Centroid-based similarity clustering.
//!
//! Lloyd's k-means over raw candidate vectors, with the cluster count
//! derived from the minimum viable group size rather than supplied by the
//! caller. Centroids are re-normalized afterwards so that member scores
//! against them read as cosine similarities.

use std::cmp::Ordering;

use affinity_core::{AffinityError, Candidate, Cluster, ClusterMember};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::normalize::{dot, normalize};

/// Fixed RNG seed: identical input always yields identical clusters.
const KMEANS_SEED: u64 = 42;
/// Number of k-means++ restarts; the lowest-inertia run wins.
const KMEANS_RESTARTS: usize = 10;
/// Upper bound on Lloyd's iterations per restart.
const MAX_ITERATIONS: usize = 100;

/// Outcome of one full k-means run.
struct KmeansRun {
    /// Cluster index assigned to each input vector, by input position.
    assignments: Vec<usize>,
    /// Final centroid vectors, indexed by cluster.
    centroids: Vec<Vec<f64>>,
    /// Lloyd's iterations performed.
    iterations: usize,
    /// Sum of squared distances from each point to its assigned centroid.
    inertia: f64,
}

/// Number of clusters for `n` candidates: `max(1, n / min_cluster_size)`.
pub fn cluster_count(n: usize, min_cluster_size: usize) -> usize {
    (n / min_cluster_size).max(1)
}

/// Partition `candidates` into similarity clusters.
///
/// Fewer candidates than `min_cluster_size` is not an error — there is not
/// enough material for one valid cluster, so the result is empty. After
/// clustering, each member's score is the dot product of its raw vector
/// with the unit-normalized centroid; that equals true cosine similarity
/// only when the input vectors are unit-normalized upstream. Clusters
/// smaller than `min_cluster_size` are dropped, and surviving members are
/// sorted by centroid similarity descending.
pub fn cluster_candidates(
    candidates: &[Candidate],
    min_cluster_size: usize,
) -> Result<Vec<Cluster>, AffinityError> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let expected = candidates[0].vector.len();
    for (index, candidate) in candidates.iter().enumerate() {
        let actual = candidate.vector.len();
        if actual != expected {
            return Err(AffinityError::DimensionMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    let min_cluster_size = min_cluster_size.max(1);
    let n = candidates.len();
    if n < min_cluster_size {
        return Ok(Vec::new());
    }

    let k = cluster_count(n, min_cluster_size);
    let vectors: Vec<&[f64]> = candidates.iter().map(|c| c.vector.as_slice()).collect();

    // Restarts share one seeded RNG, so the whole procedure is a pure
    // function of the input.
    let mut rng = StdRng::seed_from_u64(KMEANS_SEED);
    let mut best = lloyd(&vectors, k, &mut rng);
    for _ in 1..KMEANS_RESTARTS {
        let run = lloyd(&vectors, k, &mut rng);
        if run.inertia < best.inertia {
            best = run;
        }
    }

    info!(
        "K-means: k={}, {} points, {} iterations, inertia={:.4}",
        k, n, best.iterations, best.inertia
    );

    // Re-normalize centroids so member scores read as cosine similarity.
    let mut clusters: Vec<Cluster> = best
        .centroids
        .iter()
        .map(|centroid| Cluster {
            centroid: normalize(centroid),
            members: Vec::new(),
        })
        .collect();

    for (index, candidate) in candidates.iter().enumerate() {
        let cluster = &mut clusters[best.assignments[index]];
        let similarity_to_centroid = dot(&candidate.vector, &cluster.centroid);
        cluster.members.push(ClusterMember {
            id: candidate.id.clone(),
            similarity_to_centroid,
        });
    }

    clusters.retain(|cluster| cluster.members.len() >= min_cluster_size);
    for cluster in &mut clusters {
        cluster.members.sort_by(|a, b| {
            b.similarity_to_centroid
                .partial_cmp(&a.similarity_to_centroid)
                .unwrap_or(Ordering::Equal)
        });
    }

    Ok(clusters)
}

/// One Lloyd's run: k-means++ init, then assign/update until stable.
fn lloyd(vectors: &[&[f64]], k: usize, rng: &mut StdRng) -> KmeansRun {
    let n = vectors.len();
    let dim = vectors[0].len();

    let mut centroids = kmeanspp_init(vectors, k, rng);
    let mut assignments = vec![0usize; n];
    let mut iterations = 0;

    for _ in 0..MAX_ITERATIONS {
        iterations += 1;

        // Assignment step: each point to its nearest centroid.
        let mut changed = false;
        for (i, vector) in vectors.iter().enumerate() {
            let nearest = nearest_centroid(vector, &centroids);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }

        if !changed && iterations > 1 {
            break;
        }

        // Update step: recompute centroids as the mean of assigned points.
        let mut new_centroids = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];

        for (i, vector) in vectors.iter().enumerate() {
            let cluster = assignments[i];
            counts[cluster] += 1;
            for (j, &val) in vector.iter().enumerate() {
                new_centroids[cluster][j] += val;
            }
        }

        for (c, centroid) in new_centroids.iter_mut().enumerate() {
            if counts[c] > 0 {
                let count = counts[c] as f64;
                for val in centroid.iter_mut() {
                    *val /= count;
                }
            } else {
                // Empty cluster: keep previous centroid.
                centroid.clone_from(&centroids[c]);
            }
        }

        centroids = new_centroids;
    }

    let inertia = vectors
        .iter()
        .enumerate()
        .map(|(i, vector)| squared_euclidean(vector, &centroids[assignments[i]]))
        .sum();

    KmeansRun {
        assignments,
        centroids,
        iterations,
        inertia,
    }
}

/// K-means++ initialization: D²-weighted sampling from the seeded RNG.
fn kmeanspp_init(vectors: &[&[f64]], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = vectors.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(vectors[rng.gen_range(0..n)].to_vec());

    for _ in 1..k {
        let weights: Vec<f64> = vectors
            .iter()
            .map(|v| {
                centroids
                    .iter()
                    .map(|c| squared_euclidean(v, c))
                    .fold(f64::MAX, f64::min)
            })
            .collect();

        let total: f64 = weights.iter().sum();
        let picked = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut idx = n - 1;
            for (i, w) in weights.iter().enumerate() {
                if target < *w {
                    idx = i;
                    break;
                }
                target -= w;
            }
            idx
        } else {
            // All points coincide with existing centroids.
            rng.gen_range(0..n)
        };

        centroids.push(vectors[picked].to_vec());
    }

    centroids
}

/// Index of the nearest centroid.
fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f64::MAX;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

/// Squared Euclidean distance.
#[inline]
fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
