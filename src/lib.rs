//! # memeflow
//!
//! Crawls the ranked listing of a subreddit on a fixed cadence, keeps an
//! append-only score history per post, and delivers a daily top-meme
//! report.
//!
//! ## Architecture
//!
//! ```text
//! Provider → Store → Ranking → Renderer → Sender
//! ```
//!
//! - [`provider`]: Reddit OAuth client producing ranked [`Post`](domain::Post) batches
//! - [`store`]: SQLite persistence with items and append-only snapshots
//! - [`report`]: rendering and delivery of the daily report
//! - [`scheduler`]: crawl loop and the UTC-midnight-aligned report loop
//!
//! ## Quick Start
//!
//! ```bash
//! # Run both schedulers until interrupted
//! memeflow serve
//!
//! # Print the stored top 20 over the last 24 hours
//! memeflow report
//!
//! # Deliver a report right now
//! memeflow send-now
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store and
/// the report pipeline; the provider is built on demand.
pub mod app;

/// Command-line interface using clap.
///
/// Defines the CLI structure and subcommands:
/// - `serve` - Run the crawl and report schedulers
/// - `top [--take N]` - Print the live top-N ranking
/// - `report [--take N]` - Print the stored 24h ranking
/// - `run-daily-now` - Execute one report run
/// - `send-now` - Deliver a report immediately
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/memeflow/config.toml` with environment-variable
/// overrides for secrets.
pub mod config;

/// Core domain models.
///
/// - [`Post`](domain::Post): one crawled listing entry
/// - [`Item`](domain::Item): a deduplicated post with stable identity
/// - [`Snapshot`](domain::Snapshot): one observed score/comment reading
/// - [`RankedEntry`](domain::RankedEntry): ranking read model
pub mod domain;

/// Post providers.
///
/// - [`PostProvider`](provider::PostProvider): async trait for ranked-batch sources
/// - [`RedditProvider`](provider::RedditProvider): OAuth password-grant implementation
pub mod provider;

/// Report rendering and delivery.
///
/// - [`TextTableRenderer`](report::TextTableRenderer): plain-text table document
/// - [`TelegramSender`](report::TelegramSender): Bot API `sendDocument` delivery
/// - [`DailyReportJob`](report::DailyReportJob): read-render-send pipeline
pub mod report;

/// Background schedulers.
///
/// - [`CrawlScheduler`](scheduler::CrawlScheduler): periodic crawl cycles
/// - [`ReportScheduler`](scheduler::ReportScheduler): drift-free daily report loop
pub mod scheduler;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
