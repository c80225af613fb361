use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler here takes a `SessionUser`; the router is additionally wrapped in the
/// session middleware so a missing or malformed user cookie is rejected before routing.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/session
        // Effective role and author status derived from the user cookie.
        .route("/api/session", get(handlers::get_session))
}
