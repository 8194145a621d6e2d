//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI spec, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "affinity API",
        version = "0.1.0",
        description = "Stateless similarity ranking and clustering over caller-supplied feature vectors.",
    ),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Ranking", description = "Cosine-similarity ranking of candidates against a query vector"),
        (name = "Clustering", description = "Centroid-based similarity clustering"),
        (name = "Vectors", description = "Deterministic profile-to-vector encoding"),
    ),
    paths(
        crate::api::health,
        crate::api::recommend,
        crate::api::recommend_batch,
        crate::api::similar_users,
        crate::api::cluster_users,
        crate::api::vector_user,
        crate::api::vector_conversation,
        crate::api::vector_explain,
    )
)]
pub struct ApiDoc;
