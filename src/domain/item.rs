use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deduplicated identity record for one externally observed post.
///
/// At most one `Item` exists per `external_id`. Display fields are
/// overwritten with the latest observation; `created_at` and `first_seen_at`
/// are set once and never touched again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub author: String,
    pub permalink: String,
    pub content_url: String,
    pub created_at: DateTime<Utc>,
    pub thumbnail: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Immutable popularity measurement of one item at a point in time.
///
/// All snapshots written in one crawl batch share the same `observed_at`,
/// so a batch can be read back as a single cross-section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    pub item_id: i64,
    pub score: i64,
    pub comment_count: i64,
    pub observed_at: DateTime<Utc>,
}
