//! Request handlers: ranking, clustering, and profile-vector encoding.
//!
//! Handlers validate input, delegate to `affinity-compute`, and attach
//! timing metadata. No handler holds state across requests.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use affinity_compute::{cluster_candidates, select_top_k, ProfileEncoder, VectorExplanation};
use affinity_core::{AffinityError, Candidate, Cluster, ScoredCandidate};

use crate::state::AppState;

// ── Error mapping ─────────────────────────────────────────────────

#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable code.
    pub error: &'static str,
    /// Human-readable message.
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Client-input errors map to 400; anything else is a 500. No partial
/// results accompany an error response.
fn map_error(err: AffinityError) -> ApiError {
    let code = match &err {
        AffinityError::EmptyInput(_) => "empty_input",
        AffinityError::DimensionMismatch { .. } => "dimension_mismatch",
        AffinityError::Internal(_) => "internal",
    };
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        error!("Computation failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            error: code,
            detail: err.to_string(),
        }),
    )
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Service liveness for monitoring.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ── Ranking ───────────────────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub user_vector: Vec<f64>,
    pub conversation_vectors: Vec<Candidate>,
    pub top_k: Option<usize>,
    pub min_similarity: Option<f64>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub recommendations: Vec<ScoredCandidate>,
    pub total_processed: usize,
    pub processing_time_ms: f64,
}

/// Rank conversations for a user by cosine similarity.
#[utoipa::path(
    post,
    path = "/recommend",
    tag = "Ranking",
    request_body = RecommendRequest,
    responses(
        (status = 200, description = "Ranked recommendations", body = RecommendResponse),
        (status = 400, description = "Empty input or dimension mismatch", body = ErrorResponse)
    )
)]
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let start = Instant::now();

    if request.user_vector.is_empty() {
        return Err(map_error(AffinityError::EmptyInput("userVector")));
    }
    if request.conversation_vectors.is_empty() {
        return Err(map_error(AffinityError::EmptyInput("conversationVectors")));
    }

    let top_k = request.top_k.unwrap_or(state.config.engine.top_k);
    let min_similarity = request
        .min_similarity
        .unwrap_or(state.config.engine.min_similarity);
    let total = request.conversation_vectors.len();

    info!(
        "Scoring {} conversations at dimension {}",
        total,
        request.user_vector.len()
    );

    let recommendations = select_top_k(
        &request.user_vector,
        &request.conversation_vectors,
        top_k,
        min_similarity,
    )
    .map_err(map_error)?;

    let processing_time_ms = elapsed_ms(start);
    info!(
        "Found {} recommendations in {:.2}ms",
        recommendations.len(),
        processing_time_ms
    );

    Ok(Json(RecommendResponse {
        recommendations,
        total_processed: total,
        processing_time_ms,
    }))
}

// ── Batch ranking ─────────────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecommendRequest {
    pub requests: Vec<BatchRecommendItem>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecommendItem {
    pub user_id: String,
    pub user_vector: Vec<f64>,
    pub conversation_vectors: Vec<Candidate>,
    pub top_k: Option<usize>,
    pub min_similarity: Option<f64>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecommendResult {
    pub user_id: String,
    pub recommendations: Vec<ScoredCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecommendResponse {
    pub results: Vec<BatchRecommendResult>,
    pub total_users: usize,
    pub processing_time_ms: f64,
}

/// Rank conversations for many users in one call.
///
/// Sub-requests are independent: one failing user yields an item-level
/// error entry, never a failed batch. Result order mirrors request order.
#[utoipa::path(
    post,
    path = "/recommend/batch",
    tag = "Ranking",
    request_body = BatchRecommendRequest,
    responses(
        (status = 200, description = "Per-user ranking results", body = BatchRecommendResponse)
    )
)]
pub async fn recommend_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRecommendRequest>,
) -> Json<BatchRecommendResponse> {
    use rayon::prelude::*;

    let start = Instant::now();
    let total_users = request.requests.len();

    let results: Vec<BatchRecommendResult> = request
        .requests
        .into_par_iter()
        .map(|item| {
            if item.user_vector.is_empty() || item.conversation_vectors.is_empty() {
                return BatchRecommendResult {
                    user_id: item.user_id,
                    recommendations: Vec::new(),
                    error: Some("Missing vector data".to_string()),
                };
            }

            let top_k = item.top_k.unwrap_or(state.config.engine.top_k);
            let min_similarity = item
                .min_similarity
                .unwrap_or(state.config.engine.min_similarity);

            match select_top_k(
                &item.user_vector,
                &item.conversation_vectors,
                top_k,
                min_similarity,
            ) {
                Ok(recommendations) => BatchRecommendResult {
                    user_id: item.user_id,
                    recommendations,
                    error: None,
                },
                Err(err) => BatchRecommendResult {
                    user_id: item.user_id,
                    recommendations: Vec::new(),
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();

    let processing_time_ms = elapsed_ms(start);
    info!(
        "Batch: {} users in {:.2}ms",
        total_users, processing_time_ms
    );

    Json(BatchRecommendResponse {
        results,
        total_users,
        processing_time_ms,
    })
}

// ── Similar users (reverse lookup) ────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimilarUsersRequest {
    pub conv_vector: Vec<f64>,
    pub user_vectors: Vec<Candidate>,
    pub top_k: Option<usize>,
    pub min_score: Option<f64>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimilarUsersResponse {
    pub matches: Vec<ScoredCandidate>,
    pub total_processed: usize,
    pub processing_time_ms: f64,
}

/// Rank users against a conversation vector (the ranking direction
/// flipped: find members for a group instead of groups for a member).
#[utoipa::path(
    post,
    path = "/similar-users",
    tag = "Ranking",
    request_body = SimilarUsersRequest,
    responses(
        (status = 200, description = "Ranked user matches", body = SimilarUsersResponse),
        (status = 400, description = "Empty input or dimension mismatch", body = ErrorResponse)
    )
)]
pub async fn similar_users(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SimilarUsersRequest>,
) -> Result<Json<SimilarUsersResponse>, ApiError> {
    let start = Instant::now();

    if request.conv_vector.is_empty() {
        return Err(map_error(AffinityError::EmptyInput("convVector")));
    }
    if request.user_vectors.is_empty() {
        return Err(map_error(AffinityError::EmptyInput("userVectors")));
    }

    let top_k = request.top_k.unwrap_or(state.config.engine.top_k);
    let min_score = request
        .min_score
        .unwrap_or(state.config.engine.min_similarity);
    let total = request.user_vectors.len();

    let matches = select_top_k(&request.conv_vector, &request.user_vectors, top_k, min_score)
        .map_err(map_error)?;

    Ok(Json(SimilarUsersResponse {
        matches,
        total_processed: total,
        processing_time_ms: elapsed_ms(start),
    }))
}

// ── Clustering ────────────────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRequest {
    pub user_vectors: Vec<Candidate>,
    pub min_cluster_size: Option<usize>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResponse {
    pub clusters: Vec<Cluster>,
    pub total_processed: usize,
    pub processing_time_ms: f64,
}

/// Partition users into similarity clusters.
///
/// Fewer users than `minClusterSize` is not an error: the response simply
/// carries no clusters.
#[utoipa::path(
    post,
    path = "/cluster",
    tag = "Clustering",
    request_body = ClusterRequest,
    responses(
        (status = 200, description = "Similarity clusters", body = ClusterResponse),
        (status = 400, description = "Dimension mismatch", body = ErrorResponse)
    )
)]
pub async fn cluster_users(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClusterRequest>,
) -> Result<Json<ClusterResponse>, ApiError> {
    let start = Instant::now();

    let min_cluster_size = request
        .min_cluster_size
        .unwrap_or(state.config.engine.min_cluster_size);
    let total = request.user_vectors.len();

    let clusters =
        cluster_candidates(&request.user_vectors, min_cluster_size).map_err(map_error)?;

    let processing_time_ms = elapsed_ms(start);
    info!(
        "Clustered {} users into {} clusters in {:.2}ms",
        total,
        clusters.len(),
        processing_time_ms
    );

    Ok(Json(ClusterResponse {
        clusters,
        total_processed: total,
        processing_time_ms,
    }))
}

// ── Profile vectors ───────────────────────────────────────────────

fn default_learning_rate() -> f64 {
    0.2
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserVectorRequest {
    pub major_id: Option<String>,
    #[serde(default)]
    pub subject_ids: Vec<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    /// When present, the new profile data is blended into this vector
    /// instead of encoding from scratch.
    pub previous_vector: Option<Vec<f64>>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationVectorRequest {
    pub subject_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VectorResponse {
    pub vector: Vec<f64>,
    pub dim: usize,
}

/// Encode a user profile into a feature vector.
#[utoipa::path(
    post,
    path = "/vector/user",
    tag = "Vectors",
    request_body = UserVectorRequest,
    responses(
        (status = 200, description = "Encoded user vector", body = VectorResponse),
        (status = 400, description = "Previous vector has the wrong dimension", body = ErrorResponse)
    )
)]
pub async fn vector_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UserVectorRequest>,
) -> Result<Json<VectorResponse>, ApiError> {
    let encoder: &ProfileEncoder = &state.encoder;

    let vector = match request.previous_vector {
        Some(previous) => {
            if previous.len() != encoder.dimensions() {
                return Err(map_error(AffinityError::DimensionMismatch {
                    index: 0,
                    expected: encoder.dimensions(),
                    actual: previous.len(),
                }));
            }
            encoder.update_incremental(
                &previous,
                request.major_id.as_deref(),
                &request.subject_ids,
                &request.tag_ids,
                request.learning_rate,
            )
        }
        None => encoder.user_vector(
            request.major_id.as_deref(),
            &request.subject_ids,
            &request.tag_ids,
        ),
    };

    let dim = vector.len();
    Ok(Json(VectorResponse { vector, dim }))
}

/// Encode a conversation (study group) profile into a feature vector.
#[utoipa::path(
    post,
    path = "/vector/conversation",
    tag = "Vectors",
    request_body = ConversationVectorRequest,
    responses((status = 200, description = "Encoded conversation vector", body = VectorResponse))
)]
pub async fn vector_conversation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConversationVectorRequest>,
) -> Json<VectorResponse> {
    let vector = state
        .encoder
        .conversation_vector(request.subject_id.as_deref(), &request.tag_ids);
    let dim = vector.len();
    Json(VectorResponse { vector, dim })
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ExplainRequest {
    pub vector: Vec<f64>,
}

/// Summarize where a vector's mass sits (debugging aid).
#[utoipa::path(
    post,
    path = "/vector/explain",
    tag = "Vectors",
    request_body = ExplainRequest,
    responses((status = 200, description = "Vector breakdown", body = VectorExplanation))
)]
pub async fn vector_explain(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExplainRequest>,
) -> Json<VectorExplanation> {
    Json(state.encoder.explain(&request.vector))
}
