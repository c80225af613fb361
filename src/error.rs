use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use thiserror::Error;

/// ApiError
///
/// Every failure of a backend call, normalized once at the client boundary. Handlers never
/// look at raw backend payloads; they get one of these variants.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Rejected input, keyed by field name.
    #[error("validation failed on {} field(s)", .fields.len())]
    Validation { fields: BTreeMap<String, Vec<String>> },

    #[error("resource not found")]
    NotFound,

    /// Any other non-success status from the backend.
    #[error("backend returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The backend could not be reached or its reply could not be read.
    #[error("backend unreachable: {0}")]
    Network(String),
}

impl ApiError {
    /// from_backend_response
    ///
    /// Turns a non-success backend reply into an `ApiError`. The backend is not consistent
    /// about its error bodies, so field errors are looked up under `errors`, `error.details`
    /// and `fields`, and messages under `message`, `error.message`, `error` and `detail`.
    pub fn from_backend_response(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::NOT_FOUND {
            return ApiError::NotFound;
        }

        let parsed: Option<Value> = serde_json::from_str(body).ok();

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            if let Some(fields) = parsed.as_ref().and_then(extract_fields) {
                return ApiError::Validation { fields };
            }
        }

        let message = parsed
            .as_ref()
            .and_then(extract_message)
            .or_else(|| {
                let text = body.trim();
                (parsed.is_none() && !text.is_empty() && text.len() <= 200)
                    .then(|| text.to_string())
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("backend error")
                    .to_string()
            });

        ApiError::Server {
            status: status.as_u16(),
            message,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Server { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Validation { fields } => json!({ "error": "validation", "fields": fields }),
            ApiError::NotFound => json!({ "error": "not_found" }),
            ApiError::Server { message, .. } => {
                tracing::warn!(error = %self, "backend call failed");
                json!({ "error": "server", "message": message })
            }
            ApiError::Network(message) => {
                tracing::warn!(error = %self, "backend unreachable");
                json!({ "error": "network", "message": message })
            }
        };
        (status, Json(body)).into_response()
    }
}

fn extract_fields(body: &Value) -> Option<BTreeMap<String, Vec<String>>> {
    let candidates = [
        body.get("errors"),
        body.get("error").and_then(|e| e.get("details")),
        body.get("fields"),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(collect_fields)
        .find(|fields| !fields.is_empty())
}

/// Accepts `{ "field": "msg" }`, `{ "field": ["msg", ...] }` and
/// `[{ "field" | "path": "...", "message": "..." }, ...]`.
fn collect_fields(value: &Value) -> BTreeMap<String, Vec<String>> {
    let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
    match value {
        Value::Object(map) => {
            for (name, messages) in map {
                let collected: Vec<String> = match messages {
                    Value::String(s) => vec![s.clone()],
                    Value::Array(items) => items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_owned))
                        .collect(),
                    _ => continue,
                };
                if !collected.is_empty() {
                    fields.entry(name.clone()).or_default().extend(collected);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let name = item
                    .get("field")
                    .or_else(|| item.get("path"))
                    .and_then(Value::as_str);
                let message = item.get("message").and_then(Value::as_str);
                if let (Some(name), Some(message)) = (name, message) {
                    fields
                        .entry(name.to_string())
                        .or_default()
                        .push(message.to_string());
                }
            }
        }
        _ => {}
    }
    fields
}

fn extract_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| {
            body.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
        })
        .or_else(|| body.get("error").and_then(Value::as_str))
        .or_else(|| body.get("detail").and_then(Value::as_str))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_list_shape_is_collected() {
        let body = json!([
            { "field": "title", "message": "required" },
            { "path": "title", "message": "too short" },
        ]);
        let fields = collect_fields(&body);
        assert_eq!(fields["title"], vec!["required", "too short"]);
    }

    #[test]
    fn plain_text_body_becomes_message() {
        let err = ApiError::from_backend_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(
            err,
            ApiError::Server {
                status: 502,
                message: "upstream down".to_string()
            }
        );
    }
}
