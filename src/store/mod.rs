pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{Item, Post, RankedEntry, Snapshot};

pub use sqlite::SqliteStore;

/// Persistence operations for items and their popularity snapshots.
///
/// The store exclusively owns both lifecycles: items are created lazily on
/// first observation and never deleted here; snapshots are append-only.
pub trait Store: Send + Sync {
    /// Reconcile one crawl batch with stored identities and append one
    /// snapshot per post, all under the shared `observed_at`.
    ///
    /// The whole batch commits as one transaction; a mid-batch failure
    /// leaves the store untouched. Returns the number of posts written.
    fn upsert_with_snapshot(&self, posts: &[Post], observed_at: DateTime<Utc>) -> Result<usize>;

    /// Top-ranked items created within the last 24 hours, each joined with
    /// its most recent snapshot, ordered by score descending then source
    /// creation time descending.
    ///
    /// `take` is clamped to `[1, 100]` with a default of 20 when out of
    /// range. Items with no snapshot are excluded.
    fn top_ranked_last_24h(&self, take: i64) -> Result<Vec<RankedEntry>>;

    fn get_item_by_external_id(&self, external_id: &str) -> Result<Option<Item>>;

    /// Snapshot history for one item, oldest first.
    fn get_snapshots(&self, item_id: i64) -> Result<Vec<Snapshot>>;

    fn count_items(&self) -> Result<i64>;
}
