//! Exchange capability: candles and ticker snapshots for trading pairs.

mod binance;

use async_trait::async_trait;
use augur_models::{CandleRow, Ticker};
use thiserror::Error;

pub use binance::{parse_klines, parse_ticker, BinanceExchange};

/// A failed exchange call. Every variant is transient from the daemon's point
/// of view: the symbol is skipped and retried on the next cycle.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited by exchange (retry after {retry_after_ms:?} ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Exchange returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Request timed out")]
    Timeout,
}

/// Market data source. Mockable for testing.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Tag stored on candles from this exchange.
    fn name(&self) -> &str;

    /// Up to `limit` candles for `pair` (`BTC/USDT`), oldest first.
    async fn fetch_candles(
        &self,
        pair: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<CandleRow>, FetchError>;

    async fn fetch_ticker(&self, pair: &str) -> Result<Ticker, FetchError>;
}
