use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::{EffectiveRole, STAFF_PREFIXES, UserCookie},
    config::AppConfig,
};

/// Entry point for readers applying to become authors.
pub const AUTHOR_UPGRADE_PATH: &str = "/author-upgrade";
/// Landing page of the author subtree.
pub const AUTHOR_OVERVIEW_PATH: &str = "/author/overview";
pub const LOGIN_PATH: &str = "/login";
pub const SITE_ROOT: &str = "/";

/// Leading path fragments the guard never looks at: API calls, bundle assets and the
/// pages needed to obtain a cookie in the first place.
pub const DEFAULT_EXCLUDED: [&str; 11] = [
    "api",
    "api-docs",
    "swagger-ui",
    "health",
    "static",
    "assets",
    "_next/static",
    "_next/image",
    "favicon.ico",
    "login",
    "register",
];

/// File extensions served straight from the page bundle. A request whose last path segment
/// ends in one of these is an asset fetch, not a navigation.
pub const ASSET_EXTENSIONS: [&str; 12] = [
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "css", "js", "json", "txt", "map",
];

/// GuardDecision
///
/// Outcome of evaluating one navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Continue,
    Redirect(&'static str),
}

/// RouteGuard
///
/// Keeps staff inside their assigned subtree and everyone else out of the staff subtrees.
/// Holds no per-request state; one instance lives in `AppState` and is shared by all requests.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    excluded: Vec<String>,
    fail_closed: bool,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
            fail_closed: false,
        }
    }
}

impl RouteGuard {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fail_closed: config.guard_fail_closed,
            ..Self::default()
        }
    }

    pub fn with_fail_closed(mut self, fail_closed: bool) -> Self {
        self.fail_closed = fail_closed;
        self
    }

    /// Whether the guard runs for this path at all.
    pub fn is_applicable(&self, path: &str) -> bool {
        let rest = path.strip_prefix('/').unwrap_or(path);
        !self.excluded.iter().any(|prefix| rest.starts_with(prefix.as_str())) && !is_asset(rest)
    }

    /// evaluate
    ///
    /// Applies the rules in order and returns the first redirect:
    /// 1. staff outside their own prefix go to their dashboard;
    /// 2. readers and authors inside a staff prefix go to the site root;
    /// 3. existing authors hitting the upgrade page go to the author overview;
    /// 4. anonymous visitors of the author subtree go to login.
    ///
    /// A parsed cookie without author privileges is let into the author subtree so the page
    /// can refresh credentials and re-check on its own.
    pub fn evaluate(&self, path: &str, cookie: &UserCookie) -> GuardDecision {
        let absent = UserCookie::Absent;
        let cookie = match cookie {
            UserCookie::Malformed if self.fail_closed => &absent,
            other => other,
        };

        if let Some(user) = cookie.user() {
            let role = EffectiveRole::from_user(user);
            match (role.allowed_prefix(), role.dashboard()) {
                (Some(prefix), Some(dashboard)) => {
                    if !path.starts_with(prefix) {
                        return GuardDecision::Redirect(dashboard);
                    }
                }
                _ => {
                    if STAFF_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
                        return GuardDecision::Redirect(SITE_ROOT);
                    }
                }
            }
        }

        if path == AUTHOR_UPGRADE_PATH {
            if cookie.user().is_some_and(|user| user.has_author_privileges()) {
                return GuardDecision::Redirect(AUTHOR_OVERVIEW_PATH);
            }
            return GuardDecision::Continue;
        }

        if is_author_subtree(path) {
            match cookie {
                UserCookie::Absent => return GuardDecision::Redirect(LOGIN_PATH),
                UserCookie::Present(user) if !user.has_author_privileges() => {
                    tracing::debug!(path, "author privileges missing, letting the page re-check");
                }
                _ => {}
            }
        }

        GuardDecision::Continue
    }
}

fn is_asset(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.rsplit_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty()
            && ASSET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

fn is_author_subtree(path: &str) -> bool {
    path == "/author" || path.starts_with("/author/")
}

/// route_guard
///
/// Middleware wrapping the whole router. Runs before any page is served and turns a
/// redirect decision into a 307 response.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if !state.guard.is_applicable(&path) {
        return next.run(request).await;
    }

    let cookie = UserCookie::from_headers(request.headers(), &state.config.user_cookie);
    match state.guard.evaluate(&path, &cookie) {
        GuardDecision::Continue => next.run(request).await,
        GuardDecision::Redirect(target) => {
            let role = cookie.user().map(|user| EffectiveRole::from_user(user).as_str());
            tracing::debug!(path = %path, redirect_to = target, role = ?role, "route guard redirect");
            Redirect::temporary(target).into_response()
        }
    }
}
