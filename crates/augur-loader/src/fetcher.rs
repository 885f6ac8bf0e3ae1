use std::sync::Arc;
use std::time::{Duration, Instant};

use augur_models::{normalize_symbol, pair_symbol, Candle, Ticker};
use augur_store::Store;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ExchangeConfig;
use crate::error::LoaderError;
use crate::exchange::{BinanceExchange, Exchange, FetchError};
use crate::rate_limit::{IntervalGate, RateGate};

/// Pulls validated candles for one symbol at a time through a shared rate gate.
pub struct MarketDataFetcher {
    exchange: Arc<dyn Exchange>,
    gate: Arc<dyn RateGate>,
    quote: String,
    interval: String,
    limit: u32,
    call_timeout: Duration,
}

impl MarketDataFetcher {
    pub fn new(
        exchange: Arc<dyn Exchange>,
        gate: Arc<dyn RateGate>,
        config: &ExchangeConfig,
    ) -> Self {
        Self {
            exchange,
            gate,
            quote: config.quote.clone(),
            interval: config.interval.clone(),
            limit: config.candle_limit,
            call_timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// Binance behind an [`IntervalGate`] sized from `config`.
    pub fn from_config(config: &ExchangeConfig) -> Result<Self, LoaderError> {
        let exchange: Arc<dyn Exchange> = Arc::new(BinanceExchange::new(config)?);
        let gate = Arc::new(IntervalGate::new(Duration::from_millis(
            config.min_request_interval_ms,
        )));
        Ok(Self::new(exchange, gate, config))
    }

    pub fn exchange_name(&self) -> &str {
        self.exchange.name()
    }

    /// Candles for `symbol`, oldest first.
    ///
    /// One bad row fails the whole symbol: a batch is never partially trusted.
    pub async fn fetch(&self, symbol: &str) -> Result<Vec<Candle>, FetchError> {
        let pair = pair_symbol(symbol, &self.quote);
        self.gate.acquire().await;

        let rows = tokio::time::timeout(
            self.call_timeout,
            self.exchange.fetch_candles(&pair, &self.interval, self.limit),
        )
        .await
        .map_err(|_| FetchError::Timeout)??;

        let mut candles = rows
            .iter()
            .map(|row| {
                let candle = Candle::from_row(symbol, self.exchange.name(), row).ok_or_else(|| {
                    FetchError::Malformed(format!("timestamp out of range: {}", row.timestamp_ms))
                })?;
                candle.validate().map_err(FetchError::Malformed)?;
                Ok(candle)
            })
            .collect::<Result<Vec<_>, FetchError>>()?;
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    /// Current 24h ticker for `symbol`, through the same gate and timeout.
    pub async fn ticker(&self, symbol: &str) -> Result<Ticker, FetchError> {
        let pair = pair_symbol(symbol, &self.quote);
        self.gate.acquire().await;

        tokio::time::timeout(self.call_timeout, self.exchange.fetch_ticker(&pair))
            .await
            .map_err(|_| FetchError::Timeout)?
    }
}

/// Outcome of one ingestion cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub symbols_ok: usize,
    pub symbols_failed: usize,
    pub candles_inserted: usize,
}

/// Fetch and persist every symbol in turn. A failing symbol is logged and
/// skipped; it never stops the rest of the cycle.
pub async fn ingest_cycle(
    fetcher: &MarketDataFetcher,
    store: &Store,
    symbols: &[String],
) -> IngestReport {
    let start = Instant::now();
    let mut report = IngestReport::default();

    for symbol in symbols {
        let symbol = normalize_symbol(symbol);
        match ingest_symbol(fetcher, store, &symbol).await {
            Ok(inserted) => {
                report.symbols_ok += 1;
                report.candles_inserted += inserted;
            }
            Err(e) => {
                warn!(job = "ingestion", symbol = %symbol, error = %e, "Skipping symbol this cycle");
                report.symbols_failed += 1;
            }
        }
    }

    info!(
        job = "ingestion",
        ok = report.symbols_ok,
        failed = report.symbols_failed,
        inserted = report.candles_inserted,
        elapsed_ms = start.elapsed().as_millis(),
        "Ingestion cycle complete"
    );
    report
}

async fn ingest_symbol(
    fetcher: &MarketDataFetcher,
    store: &Store,
    symbol: &str,
) -> Result<usize, LoaderError> {
    let candles = fetcher.fetch(symbol).await?;
    let inserted = store.insert_candles(symbol, &candles)?;
    info!(
        job = "ingestion",
        symbol = %symbol,
        fetched = candles.len(),
        inserted,
        "Stored candles"
    );
    Ok(inserted)
}
