use std::{env, path::PathBuf, time::Duration};

/// AppConfig
///
/// Holds the frontend server's entire configuration state. Loaded once at startup and
/// shared read-only through `AppState` via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and production fail-fast checks.
    pub env: Env,
    // Base URL of the remote REST backend, without a trailing slash.
    pub backend_url: String,
    // Upper bound for a single backend call.
    pub backend_timeout: Duration,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Directory holding the compiled page bundle (index.html + assets).
    pub static_dir: PathBuf,
    // Cookie carrying the JSON user record written at login.
    pub user_cookie: String,
    // Cookie carrying the opaque backend access token.
    pub token_cookie: String,
    // When true, an unparseable user cookie is treated as no cookie at all.
    pub guard_fail_closed: bool,
}

/// Env
///
/// Runtime context: pretty logs and local defaults versus JSON logs and mandatory settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_BACKEND_URL: &str = "http://localhost:8080/api";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            backend_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            static_dir: PathBuf::from("public"),
            user_cookie: "user".to_string(),
            token_cookie: "token".to_string(),
            guard_fail_closed: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables.
    ///
    /// # Panics
    /// Panics in production when `BACKEND_API_URL` is missing: the server is useless
    /// without a backend and must not silently point at localhost.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let backend_url = match env {
            Env::Production => env::var("BACKEND_API_URL")
                .expect("FATAL: BACKEND_API_URL must be set in production."),
            Env::Local => {
                env::var("BACKEND_API_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
            }
        };

        let backend_timeout = env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Self {
            env,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            backend_timeout,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            user_cookie: env::var("USER_COOKIE_NAME").unwrap_or_else(|_| "user".to_string()),
            token_cookie: env::var("TOKEN_COOKIE_NAME").unwrap_or_else(|_| "token".to_string()),
            guard_fail_closed: env_bool("GUARD_FAIL_CLOSED").unwrap_or(false),
        }
    }
}

/// Parses the usual boolean spellings; anything else counts as unset.
pub fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}
