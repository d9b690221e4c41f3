pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "memeflow")]
#[command(about = "Crawls ranked subreddit posts and delivers daily top-meme reports", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/memeflow/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the crawl and daily-report schedulers until interrupted
    Serve,
    /// Print the current top-N ranking fetched live from Reddit
    Top {
        /// Number of posts to show (clamped to 1..=100)
        #[arg(short, long, default_value_t = 20)]
        take: i64,
    },
    /// Print the stored top-N ranking over the last 24 hours
    Report {
        /// Number of entries to show (clamped to 1..=100)
        #[arg(short, long, default_value_t = 20)]
        take: i64,
    },
    /// Execute one daily report run and print its outcome as JSON
    RunDailyNow,
    /// Render and deliver a report immediately, printing the outcome as JSON
    SendNow,
}
