use crate::{
    AppState,
    auth::{AccessToken, SessionUser},
    backend::is_valid_id,
    error::ApiError,
    models::{
        ModerationCounts, RenderRequest, RenderedChapter, RenderedContent, SessionInfo,
    },
    renderer,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

// --- Handlers ---

/// render_content
///
/// [Public Route] Classifies and renders a block of text. Pure; no backend call.
#[utoipa::path(
    post,
    path = "/api/render",
    request_body = RenderRequest,
    responses((status = 200, description = "Rendered content", body = RenderedContent))
)]
pub async fn render_content(Json(payload): Json<RenderRequest>) -> Json<RenderedContent> {
    Json(renderer::render(&payload.content))
}

/// get_chapter
///
/// [Public Route] Fetches a chapter from the backend and renders its content.
///
/// The token cookie, when present, is forwarded so unpublished chapters stay visible to
/// their authors. Backend failures come back as normalized `ApiError` bodies.
#[utoipa::path(
    get,
    path = "/api/stories/{story_id}/chapters/{chapter_id}",
    params(
        ("story_id" = String, Path, description = "Story ID"),
        ("chapter_id" = String, Path, description = "Chapter ID")
    ),
    responses(
        (status = 200, description = "Chapter with rendered content", body = RenderedChapter),
        (status = 400, description = "Malformed ID"),
        (status = 404, description = "Not Found"),
        (status = 502, description = "Backend error"),
        (status = 503, description = "Backend unreachable")
    )
)]
pub async fn get_chapter(
    AccessToken(token): AccessToken,
    State(state): State<AppState>,
    Path((story_id, chapter_id)): Path<(String, String)>,
) -> Response {
    if !is_valid_id(&story_id) || !is_valid_id(&chapter_id) {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state
        .backend
        .get_chapter(&story_id, &chapter_id, token.as_deref())
        .await
    {
        Ok(chapter) => {
            let rendered = renderer::render(&chapter.content);
            tracing::debug!(%story_id, %chapter_id, format = ?rendered.format, "chapter rendered");
            Json(RenderedChapter { chapter, rendered }).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// get_session
///
/// [Authenticated Route] Describes what the user cookie resolves to: the effective role,
/// author status, the display identity and, for staff, the dashboard the route guard
/// sends them to.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Session", body = SessionInfo),
        (status = 401, description = "No usable user cookie")
    )
)]
pub async fn get_session(SessionUser { user, role, .. }: SessionUser) -> Json<SessionInfo> {
    Json(SessionInfo {
        effective_role: role,
        has_author_privileges: user.has_author_privileges(),
        is_author_approved: user.is_author_approved,
        roles: user.roles,
        name: user.name,
        email: user.email,
        dashboard: role.dashboard().map(str::to_owned),
    })
}

/// get_moderation_counts
///
/// [Staff Route] Pending-item counters for the moderation sidebar.
///
/// *Authorization*: only admin, omod and cmod may read them.
#[utoipa::path(
    get,
    path = "/api/moderation/counts",
    responses(
        (status = 200, description = "Counts", body = ModerationCounts),
        (status = 401, description = "No usable user cookie"),
        (status = 403, description = "Not staff")
    )
)]
pub async fn get_moderation_counts(
    SessionUser { role, token, .. }: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<ModerationCounts>, Response> {
    if !role.is_staff() {
        return Err(StatusCode::FORBIDDEN.into_response());
    }
    state
        .backend
        .get_moderation_counts(token.as_deref())
        .await
        .map(Json)
        .map_err(ApiError::into_response)
}
