use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{MemeflowError, Result};
use crate::domain::{clamp_take, Item, Post, RankedEntry, Snapshot};
use crate::store::Store;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| MemeflowError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            MemeflowError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    /// Fixed-width RFC 3339 in UTC, so lexicographic comparison of stored
    /// timestamps matches chronological order in SQL.
    fn format_datetime(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
        Ok(Item {
            id: row.get(0)?,
            external_id: row.get(1)?,
            title: row.get(2)?,
            author: row.get(3)?,
            permalink: row.get(4)?,
            content_url: row.get(5)?,
            created_at: row
                .get::<_, String>(6)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            thumbnail: row.get(7)?,
            first_seen_at: row
                .get::<_, String>(8)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            last_seen_at: row
                .get::<_, String>(9)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }
}

impl Store for SqliteStore {
    fn upsert_with_snapshot(&self, posts: &[Post], observed_at: DateTime<Utc>) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let observed = Self::format_datetime(observed_at);

        for post in posts {
            // Identity row: created lazily on first observation. On conflict
            // the mutable display fields follow the latest observation while
            // created_at and first_seen_at keep their original values.
            tx.execute(
                "INSERT INTO items (external_id, title, author, permalink, content_url,
                                    created_at, thumbnail, first_seen_at, last_seen_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(external_id) DO UPDATE SET
                     title = excluded.title,
                     author = excluded.author,
                     permalink = excluded.permalink,
                     content_url = excluded.content_url,
                     thumbnail = excluded.thumbnail,
                     last_seen_at = excluded.last_seen_at",
                params![
                    post.external_id,
                    post.title,
                    post.author,
                    post.permalink,
                    post.content_url,
                    Self::format_datetime(post.created_at),
                    post.thumbnail,
                    observed,
                ],
            )?;

            // Re-derive the item id rather than trusting last_insert_rowid,
            // which is not set on the conflict path.
            let item_id: i64 = tx.query_row(
                "SELECT id FROM items WHERE external_id = ?1",
                params![post.external_id],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO snapshots (item_id, score, comment_count, observed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![item_id, post.score, post.comment_count, observed],
            )?;
        }

        tx.commit()?;
        Ok(posts.len())
    }

    fn top_ranked_last_24h(&self, take: i64) -> Result<Vec<RankedEntry>> {
        let take = clamp_take(take);
        let cutoff = Self::format_datetime(Utc::now() - Duration::hours(24));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT i.external_id, i.title, i.author, i.permalink, i.content_url,
                    s.score, s.comment_count, i.created_at, i.thumbnail, s.observed_at
             FROM items i
             JOIN snapshots s ON s.item_id = i.id
                  AND s.id = (SELECT s2.id FROM snapshots s2
                              WHERE s2.item_id = i.id
                              ORDER BY s2.observed_at DESC
                              LIMIT 1)
             WHERE i.created_at >= ?1
             ORDER BY s.score DESC, i.created_at DESC
             LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![cutoff, take], |row| {
                Ok(RankedEntry {
                    external_id: row.get(0)?,
                    title: row.get(1)?,
                    author: row.get(2)?,
                    permalink: row.get(3)?,
                    content_url: row.get(4)?,
                    score: row.get(5)?,
                    comment_count: row.get(6)?,
                    created_at: row
                        .get::<_, String>(7)
                        .ok()
                        .and_then(|s| Self::parse_datetime(&s))
                        .unwrap_or_else(Utc::now),
                    thumbnail: row.get(8)?,
                    observed_at: row
                        .get::<_, String>(9)
                        .ok()
                        .and_then(|s| Self::parse_datetime(&s))
                        .unwrap_or_else(Utc::now),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn get_item_by_external_id(&self, external_id: &str) -> Result<Option<Item>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                "SELECT id, external_id, title, author, permalink, content_url,
                        created_at, thumbnail, first_seen_at, last_seen_at
                 FROM items WHERE external_id = ?1",
                params![external_id],
                Self::item_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn get_snapshots(&self, item_id: i64) -> Result<Vec<Snapshot>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, item_id, score, comment_count, observed_at
             FROM snapshots WHERE item_id = ?1 ORDER BY observed_at ASC, id ASC",
        )?;

        let snapshots = stmt
            .query_map(params![item_id], |row| {
                Ok(Snapshot {
                    id: row.get(0)?,
                    item_id: row.get(1)?,
                    score: row.get(2)?,
                    comment_count: row.get(3)?,
                    observed_at: row
                        .get::<_, String>(4)
                        .ok()
                        .and_then(|s| Self::parse_datetime(&s))
                        .unwrap_or_else(Utc::now),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(snapshots)
    }

    fn count_items(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count)
    }
}
