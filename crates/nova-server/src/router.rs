//! Axum router construction for the player API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// CORS allows any origin so a browser client can be served from a
/// different host during development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/players", post(handlers::create_player))
        .route("/api/players/{id}", get(handlers::get_player))
        .route("/api/players/{id}/actions", post(handlers::post_action))
        .route("/api/galaxy/{galaxy}/{system}", get(handlers::get_system))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
