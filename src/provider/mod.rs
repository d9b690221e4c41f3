pub mod reddit;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::Post;

pub use reddit::{RedditConfig, RedditProvider, TokenCache};

/// Upstream feed capability: top-ranked posts observed within the last
/// 24 hours, score descending, at most `limit` entries.
#[async_trait]
pub trait PostProvider: Send + Sync {
    async fn fetch_top_recent(&self, limit: usize) -> Result<Vec<Post>>;
}
