use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a user cookie. Chapter reads still forward the token cookie
/// when it exists; the backend decides what an anonymous reader may see.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // POST /api/render
        // Classifies and renders arbitrary text (used by the chapter editor preview).
        .route("/api/render", post(handlers::render_content))
        // GET /api/stories/{story_id}/chapters/{chapter_id}
        // Backend chapter plus its rendered content.
        .route(
            "/api/stories/{story_id}/chapters/{chapter_id}",
            get(handlers::get_chapter),
        )
}
