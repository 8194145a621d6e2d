//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::state::AppState;
use crate::{api, doc};

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/recommend", post(api::recommend))
        .route("/recommend/batch", post(api::recommend_batch))
        .route("/similar-users", post(api::similar_users))
        .route("/cluster", post(api::cluster_users))
        .route("/vector/user", post(api::vector_user))
        .route("/vector/conversation", post(api::vector_conversation))
        .route("/vector/explain", post(api::vector_explain))
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(Scalar::with_url("/docs", doc::ApiDoc::openapi()))
}
