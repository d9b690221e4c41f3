use std::sync::Arc;

use tokio::sync::watch;

use crate::app::{AppContext, Result};
use crate::domain::{clamp_take, rank_posts};
use crate::report::ReportRunner;
use crate::scheduler::{shutdown_channel, CrawlScheduler, ReportScheduler};
use crate::store::Store;

/// Run both background schedulers until SIGTERM/SIGINT.
pub async fn serve(ctx: &AppContext) -> Result<()> {
    let provider = ctx.provider()?;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    spawn_signal_handler(shutdown_tx);

    let crawler = CrawlScheduler::new(
        provider,
        ctx.store.clone(),
        ctx.config.crawl.to_crawl_config(),
    );
    let reporter = ReportScheduler::with_timing(
        ctx.report_job.clone(),
        std::time::Duration::from_secs(ctx.config.report.startup_delay_secs),
        std::time::Duration::from_secs(24 * 60 * 60),
    );

    tokio::join!(crawler.run(shutdown_rx.clone()), reporter.run(shutdown_rx));
    Ok(())
}

fn spawn_signal_handler(shutdown: watch::Sender<bool>) {
    #[cfg(unix)]
    {
        tokio::spawn(async move {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("Failed to set up SIGTERM handler");
            let mut sigint =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
                    .expect("Failed to set up SIGINT handler");

            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(true);
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(true);
        });
    }
}

/// Fetch the current top posts live from the provider and print them.
pub async fn top(ctx: &AppContext, take: i64) -> Result<()> {
    let take = clamp_take(take) as usize;
    let posts = ctx.provider()?.fetch_top_recent(take).await?;
    let posts = rank_posts(posts, take);

    if posts.is_empty() {
        println!("No posts in the last 24 hours");
        return Ok(());
    }

    for (rank, post) in posts.iter().enumerate() {
        println!(
            "{:>3}. [{:>6}] {} (u/{}, {} comments)",
            rank + 1,
            post.score,
            post.title,
            post.author,
            post.comment_count
        );
        println!("     {}", post.permalink);
    }

    Ok(())
}

/// Print the stored ranking over the last 24 hours.
pub fn report(ctx: &AppContext, take: i64) -> Result<()> {
    let entries = ctx.store.top_ranked_last_24h(take)?;

    if entries.is_empty() {
        println!("No items observed in the last 24 hours");
        return Ok(());
    }

    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}. [{:>6}] {} (u/{}, {} comments)",
            rank + 1,
            entry.score,
            entry.title,
            entry.author,
            entry.comment_count
        );
        println!("     {}", entry.permalink);
    }

    Ok(())
}

/// Execute one report run, exactly as the scheduler would.
pub async fn run_daily_now(ctx: &AppContext) -> Result<()> {
    run_and_print(ctx.report_job.clone(), false).await
}

/// Render and deliver a report immediately.
pub async fn send_now(ctx: &AppContext) -> Result<()> {
    run_and_print(ctx.report_job.clone(), true).await
}

async fn run_and_print(job: Arc<dyn ReportRunner>, include_sent: bool) -> Result<()> {
    let outcome = job.run_once().await?;

    let json = if include_sent {
        serde_json::json!({ "sent": true, "count": outcome.count })
    } else {
        serde_json::json!({ "count": outcome.count })
    };
    println!("{json}");

    Ok(())
}
