use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ranked post as observed on the source feed.
///
/// This is the provider-side shape: identity plus the popularity counters
/// measured at fetch time. It is never persisted directly; the store splits
/// it into an [`Item`](crate::domain::Item) row and an append-only
/// [`Snapshot`](crate::domain::Snapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Stable natural key from the source feed (reddit thing id).
    pub external_id: String,
    pub title: String,
    pub author: String,
    /// Absolute URL of the post on the source site.
    pub permalink: String,
    /// Absolute URL of the linked content (image/gif/external page).
    pub content_url: String,
    pub score: i64,
    pub comment_count: i64,
    /// Original creation time on the source, not the observation time.
    pub created_at: DateTime<Utc>,
    pub thumbnail: Option<String>,
}
