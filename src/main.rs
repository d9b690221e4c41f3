use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use memeflow::app::AppContext;
use memeflow::cli::{commands, Cli, Commands};
use memeflow::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Serve => {
            commands::serve(&ctx).await?;
        }
        Commands::Top { take } => {
            commands::top(&ctx, take).await?;
        }
        Commands::Report { take } => {
            commands::report(&ctx, take)?;
        }
        Commands::RunDailyNow => {
            commands::run_daily_now(&ctx).await?;
        }
        Commands::SendNow => {
            commands::send_now(&ctx).await?;
        }
    }

    Ok(())
}
