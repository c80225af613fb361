use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::auth::EffectiveRole;

// --- Content Rendering ---

/// ContentFormat
///
/// The markup dialect guessed from a chapter's text. Derived per render, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContentFormat {
    Html,
    Markdown,
    Plain,
}

/// RenderedContent
///
/// Output of the renderer. `html` is always safe to inject; `paragraphs` carries the raw
/// segments for plain text so the page can lay them out itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RenderedContent {
    pub format: ContentFormat,
    pub html: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paragraphs: Vec<String>,
}

/// RenderRequest
///
/// Input payload for POST /api/render.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RenderRequest {
    #[serde(default)]
    pub content: String,
}

// --- Backend Records ---

/// Chapter
///
/// A chapter as returned by the backend. Only the fields this server touches are modelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Chapter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
}

/// RenderedChapter
///
/// Response of GET /api/stories/{story_id}/chapters/{chapter_id}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RenderedChapter {
    pub chapter: Chapter,
    pub rendered: RenderedContent,
}

/// ModerationCounts
///
/// Pending-item counters per moderation queue, passed through from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ModerationCounts {
    pub counts: BTreeMap<String, u64>,
}

// --- Session ---

/// SessionInfo
///
/// Output of GET /api/session: what the user cookie resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionInfo {
    pub effective_role: EffectiveRole,
    pub roles: Vec<String>,
    pub is_author_approved: bool,
    pub has_author_privileges: bool,
    /// Display name from the user cookie, when the login flow wrote one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Dashboard path for staff roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<String>,
}
