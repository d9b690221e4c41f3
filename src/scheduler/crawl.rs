use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::app::Result;
use crate::provider::PostProvider;
use crate::scheduler::wait_or_shutdown;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Delay before the first cycle, giving dependent infrastructure a
    /// moment to come up.
    pub startup_delay: Duration,
    /// Pause between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Batch size requested from the provider. Larger than the exposed
    /// ranking window on purpose: history is richer than what is served.
    pub fetch_limit: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(3),
            interval: Duration::from_secs(10 * 60),
            fetch_limit: 100,
        }
    }
}

/// Background loop driving the provider-to-store pipeline.
///
/// Each cycle captures one `observed_at`, fetches the ranked batch, and
/// upserts it. A failed cycle is logged and the loop continues at the next
/// tick; only shutdown stops it.
pub struct CrawlScheduler {
    provider: Arc<dyn PostProvider>,
    store: Arc<dyn Store>,
    config: CrawlConfig,
}

impl CrawlScheduler {
    pub fn new(provider: Arc<dyn PostProvider>, store: Arc<dyn Store>, config: CrawlConfig) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            fetch_limit = self.config.fetch_limit,
            "crawl scheduler started"
        );

        if wait_or_shutdown(self.config.startup_delay, &mut shutdown).await {
            return;
        }

        loop {
            let cycle = tokio::select! {
                result = self.run_cycle() => Some(result),
                _ = shutdown.wait_for(|stop| *stop) => None,
            };

            match cycle {
                None => break,
                Some(Ok(count)) => {
                    tracing::info!(count, "persisted crawl snapshots");
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "crawl cycle failed");
                }
            }

            if wait_or_shutdown(self.config.interval, &mut shutdown).await {
                break;
            }
        }

        tracing::info!("crawl scheduler stopped");
    }

    async fn run_cycle(&self) -> Result<usize> {
        // One timestamp for the whole batch so its snapshots read back as a
        // single point-in-time cross-section.
        let observed_at = Utc::now();
        let posts = self.provider.fetch_top_recent(self.config.fetch_limit).await?;
        self.store.upsert_with_snapshot(&posts, observed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use crate::app::MemeflowError;
    use crate::domain::Post;
    use crate::store::SqliteStore;

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl PostProvider for CountingProvider {
        async fn fetch_top_recent(&self, _limit: usize) -> Result<Vec<Post>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MemeflowError::Provider("boom".into()));
            }
            Ok(vec![Post {
                external_id: format!("post-{call}"),
                title: "t".into(),
                author: "a".into(),
                permalink: "https://www.reddit.com/r/memes/x".into(),
                content_url: "https://i.redd.it/x.jpg".into(),
                score: 1,
                comment_count: 0,
                created_at: Utc::now() - ChronoDuration::hours(1),
                thumbnail: None,
            }])
        }
    }

    fn config() -> CrawlConfig {
        CrawlConfig {
            startup_delay: std::time::Duration::from_secs(1),
            interval: std::time::Duration::from_secs(10),
            fetch_limit: 100,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_run_on_interval_and_persist() {
        let provider = Arc::new(CountingProvider::new(false));
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let scheduler = CrawlScheduler::new(provider.clone(), store.clone(), config());

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        // Cycles fire at t=1s, 11s, 21s.
        tokio::time::sleep(std::time::Duration::from_secs(25)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.count_items().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_does_not_stop_the_loop() {
        let provider = Arc::new(CountingProvider::new(true));
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let scheduler = CrawlScheduler::new(provider.clone(), store.clone(), config());

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(std::time::Duration::from_secs(25)).await;
        assert!(!handle.is_finished());

        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(provider.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(store.count_items().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_first_cycle() {
        let provider = Arc::new(CountingProvider::new(false));
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let scheduler = CrawlScheduler::new(provider.clone(), store, config());

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
