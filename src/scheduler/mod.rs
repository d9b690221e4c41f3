pub mod crawl;
pub mod daily;

use std::time::Duration;

use tokio::sync::watch;

pub use crawl::{CrawlConfig, CrawlScheduler};
pub use daily::{until_next_utc_midnight, ReportScheduler};

/// Process-wide shutdown signal shared by both scheduler loops.
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Sleep for `duration`, aborting early when shutdown is requested.
/// Returns true when shutdown was requested.
pub(crate) async fn wait_or_shutdown(
    duration: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown.wait_for(|stop| *stop) => true,
    }
}
