use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Staff Router Module
///
/// Endpoints backing the /Admin, /Op and /Content dashboards. The role check lives in the
/// handlers; the session layer above only guarantees a user cookie is present.
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        // GET /api/moderation/counts
        // Pending counts per moderation queue, proxied from the backend.
        .route(
            "/api/moderation/counts",
            get(handlers::get_moderation_counts),
        )
}
