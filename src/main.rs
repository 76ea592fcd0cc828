use anyhow::Context;
use board_metrics::cli::{commands, Cli};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    info!("Starting board-metrics v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config().context("Invalid configuration")?;
    commands::serve(config).await.context("board-metrics failed")?;

    info!("board-metrics stopped");
    Ok(())
}
