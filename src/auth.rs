use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::config::AppConfig;

/// AuthUser
///
/// The user record written into the user cookie by the login flow. Only the fields the
/// server reads are modelled; anything else in the cookie is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub is_author_approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Author status comes from either the role list or the approval flag.
    /// Every author check in the crate goes through here.
    pub fn has_author_privileges(&self) -> bool {
        self.has_role("author") || self.is_author_approved
    }
}

/// EffectiveRole
///
/// The single role used for route gating. Precedence is fixed:
/// admin > omod > cmod > author > reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum EffectiveRole {
    Admin,
    Omod,
    Cmod,
    Author,
    Reader,
}

/// Prefixes reserved for staff; in the same order as the precedence above.
pub const STAFF_PREFIXES: [&str; 3] = ["/Admin", "/Op", "/Content"];

impl EffectiveRole {
    pub fn from_user(user: &AuthUser) -> Self {
        if user.has_role("admin") {
            EffectiveRole::Admin
        } else if user.has_role("omod") {
            EffectiveRole::Omod
        } else if user.has_role("cmod") {
            EffectiveRole::Cmod
        } else if user.has_author_privileges() {
            EffectiveRole::Author
        } else {
            EffectiveRole::Reader
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffectiveRole::Admin => "admin",
            EffectiveRole::Omod => "omod",
            EffectiveRole::Cmod => "cmod",
            EffectiveRole::Author => "author",
            EffectiveRole::Reader => "reader",
        }
    }

    pub fn is_staff(self) -> bool {
        self.allowed_prefix().is_some()
    }

    /// The only subtree a staff role may navigate. `None` for non-staff roles.
    pub fn allowed_prefix(self) -> Option<&'static str> {
        match self {
            EffectiveRole::Admin => Some("/Admin"),
            EffectiveRole::Omod => Some("/Op"),
            EffectiveRole::Cmod => Some("/Content"),
            EffectiveRole::Author | EffectiveRole::Reader => None,
        }
    }

    /// Where a staff member lands when they stray outside their subtree.
    pub fn dashboard(self) -> Option<&'static str> {
        match self {
            EffectiveRole::Admin => Some("/Admin"),
            EffectiveRole::Omod => Some("/Op/dashboard"),
            EffectiveRole::Cmod => Some("/Content/dashboard"),
            EffectiveRole::Author | EffectiveRole::Reader => None,
        }
    }
}

/// UserCookie
///
/// What the user cookie held on this request.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCookie {
    Absent,
    /// Present but not a valid user record.
    Malformed,
    Present(AuthUser),
}

impl UserCookie {
    /// Interprets a raw cookie value. Parse failures are logged and reported as `Malformed`.
    pub fn from_value(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return UserCookie::Absent;
        };

        match serde_json::from_str::<AuthUser>(raw) {
            Ok(user) => UserCookie::Present(user),
            Err(e) => {
                tracing::error!(error = %e, "failed to parse user cookie");
                UserCookie::Malformed
            }
        }
    }

    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let jar = CookieJar::from_headers(headers);
        Self::from_value(jar.get(cookie_name).map(Cookie::value))
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            UserCookie::Present(user) => Some(user),
            UserCookie::Absent | UserCookie::Malformed => None,
        }
    }
}

/// SessionUser Extractor Result
///
/// The resolved identity of a request carrying a parseable user cookie, together with the
/// backend access token when one is set. Replaces any ambient "current user" state: handlers
/// that need the user take it as an argument.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user: AuthUser,
    pub role: EffectiveRole,
    pub token: Option<String>,
}

/// Rejects with 401 when the user cookie is missing or malformed.
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let user = match UserCookie::from_headers(&parts.headers, &config.user_cookie) {
            UserCookie::Present(user) => user,
            UserCookie::Absent | UserCookie::Malformed => return Err(StatusCode::UNAUTHORIZED),
        };

        let role = EffectiveRole::from_user(&user);
        let token = read_token(&parts.headers, &config.token_cookie);

        Ok(SessionUser { user, role, token })
    }
}

/// AccessToken
///
/// The backend access token from the token cookie, if any. Never rejects; anonymous
/// readers simply call the backend without credentials.
#[derive(Debug, Clone, Default)]
pub struct AccessToken(pub Option<String>);

impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(AccessToken(read_token(&parts.headers, &config.token_cookie)))
    }
}

fn read_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
