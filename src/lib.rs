use axum::{
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod renderer;

// JSON API split by caller (public, signed in, staff).
pub mod routes;
use routes::{authenticated, public, staff};
use auth::SessionUser;

// --- Public Re-exports ---

pub use backend::{BackendState, HttpBackend, MockBackend};
pub use config::AppConfig;
pub use error::ApiError;
pub use guard::{GuardDecision, RouteGuard};

/// ApiDoc
///
/// OpenAPI document for the JSON API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::render_content, handlers::get_chapter,
        handlers::get_session, handlers::get_moderation_counts
    ),
    components(
        schemas(
            models::ContentFormat, models::RenderedContent, models::RenderRequest,
            models::Chapter, models::RenderedChapter, models::ModerationCounts,
            models::SessionInfo, auth::EffectiveRole,
        )
    ),
    tags(
        (name = "story-portal", description = "Story platform frontend API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, built once at startup and cloned per request. This is
/// the only application-wide state; there are no globals.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: AppConfig,
    /// Remote REST backend client.
    pub backend: BackendState,
    /// Navigation access policy.
    pub guard: RouteGuard,
}

impl AppState {
    pub fn new(config: AppConfig, backend: BackendState) -> Self {
        let guard = RouteGuard::from_config(&config);
        Self {
            config,
            backend,
            guard,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for BackendState {
    fn from_ref(app_state: &AppState) -> BackendState {
        app_state.backend.clone()
    }
}

/// session_middleware
///
/// Rejects requests without a usable user cookie before they reach a signed-in route.
/// The `SessionUser` extractor does the work and answers 401 on failure.
async fn session_middleware(_session: SessionUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the JSON API, the docs and the guarded page bundle, then wraps everything in
/// the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // Unknown paths are page navigations: serve the bundle, fall back to the SPA shell.
    let static_dir = &state.config.static_dir;
    let pages = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .merge(staff::staff_routes())
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    session_middleware,
                )),
        )
        .fallback_service(pages)
        // The guard sees every request first and decides for itself which paths it covers.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::route_guard,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by the layer above so
/// every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
