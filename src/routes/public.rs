use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated, read-only endpoints.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers and monitoring.
        .route("/health", get(|| async { "ok" }))
        // GET /api/bookmarks?author=...
        // Lists all bookmarks (most recently modified first) or those of one author.
        .route("/api/bookmarks", get(handlers::get_bookmarks))
}
