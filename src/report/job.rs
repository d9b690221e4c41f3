use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::app::Result;
use crate::domain::{ReportOutcome, DEFAULT_TAKE};
use crate::report::{ReportRenderer, ReportRunner, ReportSender};
use crate::store::Store;

/// Reads the current 24h ranking, renders it, and delivers the document.
///
/// Delivery is at-least-once: there is no redelivery queue, a failed send is
/// surfaced to the caller and the next scheduled or on-demand run delivers
/// a fresh report built from then-current state.
pub struct DailyReportJob {
    store: Arc<dyn Store>,
    renderer: Box<dyn ReportRenderer>,
    sender: Arc<dyn ReportSender>,
}

impl DailyReportJob {
    pub fn new(
        store: Arc<dyn Store>,
        renderer: Box<dyn ReportRenderer>,
        sender: Arc<dyn ReportSender>,
    ) -> Self {
        Self {
            store,
            renderer,
            sender,
        }
    }
}

#[async_trait]
impl ReportRunner for DailyReportJob {
    async fn run_once(&self) -> Result<ReportOutcome> {
        let entries = self.store.top_ranked_last_24h(DEFAULT_TAKE)?;
        if entries.is_empty() {
            tracing::warn!("daily report: no items observed in the last 24h");
        }

        let now = Utc::now();
        let document = self.renderer.render(&entries, now);

        let filename = format!("MemeReport-{}.txt", now.format("%Y%m%d"));
        let caption = format!("Top memes report for {}", now.format("%Y-%m-%d"));
        self.sender
            .send_document(document.clone(), &filename, &caption)
            .await?;

        tracing::info!(count = entries.len(), "daily report delivered");
        Ok(ReportOutcome {
            count: entries.len(),
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Duration;

    use crate::domain::Post;
    use crate::report::TextTableRenderer;
    use crate::store::SqliteStore;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String, usize)>>,
    }

    #[async_trait]
    impl ReportSender for RecordingSender {
        async fn send_document(
            &self,
            document: Vec<u8>,
            filename: &str,
            caption: &str,
        ) -> Result<()> {
            self.sent.lock().unwrap().push((
                filename.to_string(),
                caption.to_string(),
                document.len(),
            ));
            Ok(())
        }
    }

    fn post(external_id: &str, score: i64) -> Post {
        Post {
            external_id: external_id.into(),
            title: format!("title {external_id}"),
            author: "author".into(),
            permalink: format!("https://www.reddit.com/r/memes/comments/{external_id}/"),
            content_url: format!("https://i.redd.it/{external_id}.jpg"),
            score,
            comment_count: 0,
            created_at: Utc::now() - Duration::hours(1),
            thumbnail: None,
        }
    }

    fn job_with(
        store: Arc<SqliteStore>,
        sender: Arc<RecordingSender>,
    ) -> DailyReportJob {
        DailyReportJob::new(store, Box::new(TextTableRenderer::new()), sender)
    }

    #[tokio::test]
    async fn test_run_once_delivers_current_ranking() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store
            .upsert_with_snapshot(&[post("a", 10), post("b", 50)], Utc::now())
            .unwrap();

        let sender = Arc::new(RecordingSender::default());
        let job = job_with(store, sender.clone());

        let outcome = job.run_once().await.unwrap();
        assert_eq!(outcome.count, 2);
        assert!(!outcome.document.is_empty());

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].0.starts_with("MemeReport-"));
        assert!(sent[0].1.starts_with("Top memes report for "));
    }

    #[tokio::test]
    async fn test_run_once_with_empty_store_still_delivers() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let sender = Arc::new(RecordingSender::default());
        let job = job_with(store, sender.clone());

        let outcome = job.run_once().await.unwrap();
        assert_eq!(outcome.count, 0);
        assert!(!outcome.document.is_empty());
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_once_twice_delivers_twice() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store
            .upsert_with_snapshot(&[post("a", 10)], Utc::now())
            .unwrap();

        let sender = Arc::new(RecordingSender::default());
        let job = job_with(store, sender.clone());

        job.run_once().await.unwrap();
        job.run_once().await.unwrap();
        assert_eq!(sender.sent.lock().unwrap().len(), 2);
    }
}
