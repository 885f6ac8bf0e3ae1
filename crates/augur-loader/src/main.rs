use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use augur_loader::config::LoaderConfig;
use augur_loader::daemon::Daemon;
use augur_loader::fetcher::MarketDataFetcher;

#[derive(Parser, Debug)]
#[command(
    name = "augur-loader",
    about = "Augur loader daemon - ingests exchange candles, runs persona inference, and prunes old data"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/augur.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print the current 24h ticker for SYMBOL as JSON and exit
    #[arg(long, value_name = "SYMBOL")]
    ticker: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config = LoaderConfig::from_toml(&config_str).with_context(|| "Invalid loader config")?;

    if let Some(symbol) = cli.ticker {
        let fetcher = MarketDataFetcher::from_config(&config.exchange)?;
        let ticker = fetcher
            .ticker(&symbol)
            .await
            .with_context(|| format!("Failed to fetch ticker for {symbol}"))?;
        println!("{}", serde_json::to_string_pretty(&ticker)?);
        return Ok(());
    }

    let daemon = Daemon::from_config(config).with_context(|| "Failed to start daemon")?;
    let cancel = daemon.cancel_token();

    // Handle shutdown signals
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received shutdown signal");
        cancel.cancel();
    });

    daemon
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Daemon error: {e}"))?;

    Ok(())
}
