//! Integration tests for the ranking and clustering JSON contract.
//!
//! Since `affinity-server` is a binary crate (no lib.rs), we test the wire
//! contract by defining mirror types and driving the same compute calls
//! the handlers make, then validating serialization shape and field names.

use serde::{Deserialize, Serialize};

use affinity_compute::{cluster_candidates, select_top_k};
use affinity_core::Candidate;

// ── Mirror types matching the wire contract ───────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendRequest {
    user_vector: Vec<f64>,
    conversation_vectors: Vec<WireCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_similarity: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireCandidate {
    id: String,
    vector: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendResponse {
    recommendations: Vec<WireScored>,
    total_processed: usize,
    processing_time_ms: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireScored {
    id: String,
    similarity: f64,
    rank: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireClusterMember {
    id: String,
    similarity_to_centroid: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireCluster {
    centroid: Vec<f64>,
    members: Vec<WireClusterMember>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireErrorResponse {
    error: String,
    detail: String,
}

// ── Helpers ───────────────────────────────────────────────────────

fn candidate(id: &str, vector: Vec<f64>) -> Candidate {
    Candidate::new(id, vector)
}

fn spec_candidates() -> Vec<Candidate> {
    vec![
        candidate(
            "conv-1",
            vec![0.15, 0.25, 0.28, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ),
        candidate(
            "conv-2",
            vec![0.0, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ),
        candidate(
            "conv-3",
            vec![0.12, 0.22, 0.32, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ),
    ]
}

fn spec_query() -> Vec<f64> {
    vec![0.1, 0.2, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
}

// ── Contract tests ────────────────────────────────────────────────

#[test]
fn request_fields_are_camel_case() {
    let request = RecommendRequest {
        user_vector: spec_query(),
        conversation_vectors: vec![WireCandidate {
            id: "conv-1".to_string(),
            vector: vec![0.1, 0.2],
        }],
        top_k: Some(10),
        min_similarity: Some(0.3),
    };

    let json = serde_json::to_string(&request).unwrap();
    assert!(json.contains("\"userVector\""));
    assert!(json.contains("\"conversationVectors\""));
    assert!(json.contains("\"topK\""));
    assert!(json.contains("\"minSimilarity\""));
}

#[test]
fn request_defaults_are_optional_on_the_wire() {
    // topK and minSimilarity may be omitted; the server falls back to its
    // configured defaults.
    let json = r#"{
        "userVector": [0.1, 0.2],
        "conversationVectors": [{"id": "c1", "vector": [0.1, 0.2]}]
    }"#;

    let parsed: RecommendRequest = serde_json::from_str(json).unwrap();
    assert!(parsed.top_k.is_none());
    assert!(parsed.min_similarity.is_none());
    assert_eq!(parsed.conversation_vectors.len(), 1);
}

#[test]
fn malformed_candidate_entries_fail_to_parse() {
    // A candidate without a vector must be rejected at the boundary, not
    // deep inside scoring.
    let json = r#"{
        "userVector": [0.1],
        "conversationVectors": [{"id": "c1"}]
    }"#;
    assert!(serde_json::from_str::<RecommendRequest>(json).is_err());

    let garbage = "not json";
    assert!(serde_json::from_str::<RecommendRequest>(garbage).is_err());
}

#[test]
fn spec_scenario_keeps_matching_pair_and_drops_orthogonal() {
    let result = select_top_k(&spec_query(), &spec_candidates(), 10, 0.3).unwrap();

    // conv-1 and conv-3 both point the query's way (conv-3 closer);
    // conv-2 is orthogonal and excluded by the threshold.
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].id, "conv-3");
    assert_eq!(result[0].rank, 1);
    assert_eq!(result[1].id, "conv-1");
    assert_eq!(result[1].rank, 2);
    assert!(result.iter().all(|r| r.similarity >= 0.3));
    assert!(result[0].similarity >= result[1].similarity);
}

#[test]
fn ranked_response_serializes_with_expected_field_names() {
    let recommendations = select_top_k(&spec_query(), &spec_candidates(), 10, 0.3).unwrap();
    let response_json = serde_json::json!({
        "recommendations": recommendations,
        "totalProcessed": 3,
        "processingTimeMs": 0.42,
    });

    let parsed: RecommendResponse = serde_json::from_value(response_json).unwrap();
    assert_eq!(parsed.total_processed, 3);
    assert_eq!(parsed.recommendations.len(), 2);
    assert_eq!(parsed.recommendations[0].id, "conv-3");
    assert_eq!(parsed.recommendations[0].rank, 1);
}

#[test]
fn cluster_members_serialize_with_camel_case_similarity() {
    let users: Vec<Candidate> = (0..6)
        .map(|i| candidate(&format!("u{i}"), vec![1.0, 0.1 * i as f64]))
        .collect();

    let clusters = cluster_candidates(&users, 5).unwrap();
    assert!(!clusters.is_empty());

    let json = serde_json::to_string(&clusters).unwrap();
    assert!(json.contains("\"similarityToCentroid\""));
    assert!(json.contains("\"centroid\""));

    let parsed: Vec<WireCluster> = serde_json::from_str(&json).unwrap();
    let total_members: usize = parsed.iter().map(|c| c.members.len()).sum();
    assert_eq!(total_members, 6);
}

#[test]
fn error_response_shape() {
    let err = serde_json::json!({
        "error": "dimension_mismatch",
        "detail": "Candidate 1 has dimension 2, expected 3",
    });
    let parsed: WireErrorResponse = serde_json::from_value(err).unwrap();
    assert_eq!(parsed.error, "dimension_mismatch");
    assert!(parsed.detail.contains("Candidate 1"));
}

#[test]
fn batch_items_stay_in_request_order() {
    // The batch endpoint fans out with rayon but must mirror input order;
    // the underlying per-item computation is order-independent, so the
    // contract reduces to: collecting indexed results preserves indexing.
    use rayon::prelude::*;

    let queries: Vec<Vec<f64>> = (1..=8).map(|i| vec![i as f64, 0.0]).collect();
    let candidates = vec![candidate("c", vec![1.0, 0.0])];

    let results: Vec<(usize, usize)> = queries
        .par_iter()
        .enumerate()
        .map(|(i, q)| (i, select_top_k(q, &candidates, 10, 0.0).unwrap().len()))
        .collect();

    let order: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
    assert_eq!(order, (0..8).collect::<Vec<_>>());
    assert!(results.iter().all(|(_, n)| *n == 1));
}
