use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{MemeflowError, Result};
use crate::config::Config;
use crate::provider::{PostProvider, RedditProvider};
use crate::report::{DailyReportJob, NullReportSender, ReportSender, TelegramSender, TextTableRenderer};
use crate::store::sqlite::SqliteStore;

/// Wired-up application: store and the report pipeline, built once from
/// configuration and shared by the CLI commands and schedulers.
///
/// The provider is constructed on demand so that store-backed commands
/// keep working without Reddit credentials.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub report_job: Arc<DailyReportJob>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.store.db_path.clone() {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);

        let sender: Arc<dyn ReportSender> = if config.telegram.is_configured() {
            Arc::new(TelegramSender::new(config.telegram.clone()))
        } else {
            tracing::warn!("telegram not configured, reports will be logged and dropped");
            Arc::new(NullReportSender::new())
        };
        let report_job = Arc::new(DailyReportJob::new(
            store.clone(),
            Box::new(TextTableRenderer::new()),
            sender,
        ));

        Ok(Self {
            config,
            store,
            report_job,
        })
    }

    /// Build the Reddit provider. Credentials are mandatory only for the
    /// commands that fetch from Reddit; everything else never calls this.
    pub fn provider(&self) -> Result<Arc<dyn PostProvider>> {
        if !self.config.reddit.has_credentials() {
            return Err(MemeflowError::Config(
                "Reddit credentials are not configured; set them in config.toml \
                 or via REDDIT_CLIENT_ID/REDDIT_CLIENT_SECRET/REDDIT_USERNAME/REDDIT_PASSWORD"
                    .into(),
            ));
        }

        Ok(Arc::new(RedditProvider::new(self.config.reddit.clone())))
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| MemeflowError::Config("Could not find data directory".into()))?;
        let memeflow_dir = data_dir.join("memeflow");
        std::fs::create_dir_all(&memeflow_dir)?;
        Ok(memeflow_dir.join("memeflow.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::report::ReportRunner;
    use crate::store::Store;

    fn context_without_credentials() -> (AppContext, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.store.db_path = Some(dir.path().join("memeflow.db"));
        (AppContext::new(config).unwrap(), dir)
    }

    #[tokio::test]
    async fn test_report_path_works_without_reddit_credentials() {
        let (ctx, _dir) = context_without_credentials();

        // Store-backed reporting only needs the store and the sender.
        let outcome = ctx.report_job.run_once().await.unwrap();
        assert_eq!(outcome.count, 0);
        assert!(ctx.store.top_ranked_last_24h(10).unwrap().is_empty());
    }

    #[test]
    fn test_provider_requires_credentials() {
        let (ctx, _dir) = context_without_credentials();

        let err = ctx.provider().err().expect("provider must need credentials");
        assert!(matches!(err, MemeflowError::Config(_)));
    }
}
