use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evslot::cli::{self, Cli};
use evslot::config::Config;
use evslot::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    if let Some(data_dir) = cli.data_dir.clone() {
        config.store.data_dir = data_dir;
    }

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting evslot v{}", env!("CARGO_PKG_VERSION"));

    let ctx = AppContext::init(config)?;

    if let Err(e) = cli::run(&ctx, cli.command).await {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}
