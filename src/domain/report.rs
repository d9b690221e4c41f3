use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Post;

/// Default number of entries in a ranking when the caller passes an
/// out-of-range `take`.
pub const DEFAULT_TAKE: i64 = 20;

/// Largest `take` a caller may request.
pub const MAX_TAKE: i64 = 100;

/// Ranking read model: an item joined with its most recent snapshot.
///
/// Constructed on read, discarded after the response; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    pub external_id: String,
    pub title: String,
    pub author: String,
    pub permalink: String,
    pub content_url: String,
    pub score: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub thumbnail: Option<String>,
    /// When the winning snapshot was taken.
    pub observed_at: DateTime<Utc>,
}

/// Result of one daily-report execution.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Number of ranked entries included in the report.
    pub count: usize,
    /// The rendered document that was (or would be) delivered.
    pub document: Vec<u8>,
}

/// Clamp a requested ranking size to `[1, MAX_TAKE]`, defaulting to
/// [`DEFAULT_TAKE`] when out of range.
pub fn clamp_take(take: i64) -> i64 {
    if (1..=MAX_TAKE).contains(&take) {
        take
    } else {
        DEFAULT_TAKE
    }
}

/// Just-in-case ordering for provider results: score descending, then
/// source creation time descending, truncated to `take`.
///
/// The provider already returns a ranked listing; this keeps the exposed
/// ordering guarantee independent of upstream behavior.
pub fn rank_posts(mut posts: Vec<Post>, take: usize) -> Vec<Post> {
    posts.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    posts.truncate(take);
    posts
}
