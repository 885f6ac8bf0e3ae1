use anyhow::{Context, Result};
use augur_models::{AugurConfig, PredictionQuery, Timeframe};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use augur::QueryService;

#[derive(Parser, Debug)]
#[command(name = "augur", about = "Query prices, persona predictions, and consensus signals")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/augur.toml")]
    config: String,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Consensus over the most recent active predictions
    Consensus {
        symbol: String,
        #[arg(short, long, default_value = "24h")]
        timeframe: Timeframe,
    },
    /// Recorded predictions, newest first
    Predictions {
        symbol: String,
        #[arg(short, long)]
        persona: Option<String>,
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
        /// Include retired predictions
        #[arg(long)]
        all: bool,
        #[arg(short, long, default_value_t = PredictionQuery::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Candles from the last N hours, newest first
    Prices {
        symbol: String,
        #[arg(long, default_value_t = 24)]
        hours: u32,
        /// Exchange to read (defaults to the configured primary)
        #[arg(short, long)]
        exchange: Option<String>,
    },
    /// The most recent candle
    Latest {
        symbol: String,
        /// Exchange to read (defaults to the configured primary)
        #[arg(short, long)]
        exchange: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config: AugurConfig =
        toml::from_str(&config_str).with_context(|| "Failed to parse config")?;

    let service = QueryService::from_config(&config)
        .with_context(|| format!("Failed to open store: {}", config.store.sqlite_path))?;

    tracing::debug!(path = %config.store.sqlite_path, command = ?cli.command, "Running query");

    match cli.command {
        Command::Consensus { symbol, timeframe } => {
            print_json(&service.consensus(&symbol, timeframe), cli.pretty)
        }
        Command::Predictions {
            symbol,
            persona,
            timeframe,
            all,
            limit,
        } => {
            let query = PredictionQuery {
                persona,
                timeframe,
                active_only: !all,
                limit,
                ..PredictionQuery::for_symbol(&symbol)
            };
            let predictions = service
                .predictions(&query)
                .context("Failed to query predictions")?;
            print_json(&predictions, cli.pretty)
        }
        Command::Prices {
            symbol,
            hours,
            exchange,
        } => {
            let exchange = exchange.as_deref().unwrap_or(service.primary_exchange());
            let candles = service
                .prices_on(&symbol, exchange, hours)
                .context("Failed to query prices")?;
            print_json(&candles, cli.pretty)
        }
        Command::Latest { symbol, exchange } => {
            let exchange = exchange.as_deref().unwrap_or(service.primary_exchange());
            let candle = service
                .latest_on(&symbol, exchange)
                .await
                .context("Failed to query latest candle")?;
            print_json(&candle, cli.pretty)
        }
    }
}
