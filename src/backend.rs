use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{
    error::ApiError,
    models::{Chapter, ModerationCounts},
};

/// ContentBackend
///
/// Contract for everything this server asks of the remote REST backend. Handlers only see
/// this trait, so tests swap in `MockBackend` without a network.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Fetches one chapter. `token` is forwarded as a bearer credential when present.
    async fn get_chapter(
        &self,
        story_id: &str,
        chapter_id: &str,
        token: Option<&str>,
    ) -> Result<Chapter, ApiError>;

    /// Pending-item counters for the moderation queues.
    async fn get_moderation_counts(&self, token: Option<&str>)
    -> Result<ModerationCounts, ApiError>;
}

/// BackendState
///
/// Shared handle to the backend client inside `AppState`.
pub type BackendState = Arc<dyn ContentBackend>;

/// Identifiers travel in URL paths, so only a conservative character set is accepted.
/// Callers check this before handing IDs to a backend.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// HttpBackend
///
/// reqwest-backed implementation talking JSON to `BACKEND_API_URL`.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.get(&url).header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_backend_response(status, &body);
            tracing::debug!(%url, %status, error = %err, "backend rejected request");
            return Err(err);
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::Network(format!("invalid backend payload: {e}")))?;
        serde_json::from_value(unwrap_envelope(value))
            .map_err(|e| ApiError::Network(format!("unexpected backend payload: {e}")))
    }
}

#[async_trait]
impl ContentBackend for HttpBackend {
    async fn get_chapter(
        &self,
        story_id: &str,
        chapter_id: &str,
        token: Option<&str>,
    ) -> Result<Chapter, ApiError> {
        self.get_json(&format!("stories/{story_id}/chapters/{chapter_id}"), token)
            .await
    }

    async fn get_moderation_counts(
        &self,
        token: Option<&str>,
    ) -> Result<ModerationCounts, ApiError> {
        let value: Value = self.get_json("moderation/counts", token).await?;
        Ok(counts_from_value(&value))
    }
}

/// Some endpoints wrap their payload as `{ "data": ... }`.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Accepts either `{ "counts": { ... } }` or a flat `{ "queue": n, ... }` object.
/// Non-numeric entries are ignored.
fn counts_from_value(value: &Value) -> ModerationCounts {
    let source = value.get("counts").unwrap_or(value);
    let counts = source
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(queue, n)| n.as_u64().map(|n| (queue.clone(), n)))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();
    ModerationCounts { counts }
}

/// MockBackend
///
/// In-memory backend for tests. Serves the chapters it was seeded with and records the last
/// token it received.
#[derive(Default)]
pub struct MockBackend {
    chapters: HashMap<(String, String), Chapter>,
    counts: ModerationCounts,
    /// When set, every call fails with this error.
    pub fail_with: Option<ApiError>,
    last_token: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(err: ApiError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub fn with_chapter(mut self, story_id: &str, chapter: Chapter) -> Self {
        self.chapters
            .insert((story_id.to_string(), chapter.id.clone()), chapter);
        self
    }

    pub fn with_counts(mut self, counts: ModerationCounts) -> Self {
        self.counts = counts;
        self
    }

    pub fn last_token(&self) -> Option<String> {
        self.last_token.lock().ok().and_then(|guard| guard.clone())
    }

    fn record(&self, token: Option<&str>) -> Result<(), ApiError> {
        if let Ok(mut guard) = self.last_token.lock() {
            *guard = token.map(str::to_owned);
        }
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentBackend for MockBackend {
    async fn get_chapter(
        &self,
        story_id: &str,
        chapter_id: &str,
        token: Option<&str>,
    ) -> Result<Chapter, ApiError> {
        self.record(token)?;
        self.chapters
            .get(&(story_id.to_string(), chapter_id.to_string()))
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn get_moderation_counts(
        &self,
        token: Option<&str>,
    ) -> Result<ModerationCounts, ApiError> {
        self.record(token)?;
        Ok(self.counts.clone())
    }
}
