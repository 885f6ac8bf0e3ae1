use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV observation as stored in the price store.
///
/// The natural key is `(symbol, exchange, timestamp)`. `symbol` is the bare
/// uppercase ticker (`BTC`, not `BTC/USDT`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub symbol: String,
    pub exchange: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Build a candle from an exchange row `(timestamp_ms, o, h, l, c, v)`.
    /// Returns `None` when the timestamp is out of range.
    pub fn from_row(symbol: &str, exchange: &str, row: &CandleRow) -> Option<Self> {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(row.timestamp_ms)?;
        Some(Self {
            symbol: normalize_symbol(symbol),
            exchange: exchange.to_string(),
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        })
    }

    /// Check the OHLCV invariants. Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(format!("non-positive price at {}", self.timestamp));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(format!("negative volume at {}", self.timestamp));
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(format!("high below body at {}", self.timestamp));
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(format!("low above body at {}", self.timestamp));
        }
        if self.timestamp.second() != 0 || self.timestamp.nanosecond() != 0 {
            return Err(format!("timestamp {} is not minute-aligned", self.timestamp));
        }
        Ok(())
    }
}

/// A raw candle as returned by an exchange capability, before it is tagged
/// with a symbol and exchange.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CandleRow {
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Current price snapshot for a trading pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticker {
    pub pair: String,
    pub last_price: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
    pub change_percent_24h: f64,
    pub timestamp: DateTime<Utc>,
}

/// Strip any pair suffix and uppercase: `btc/usdt` -> `BTC`.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .split('/')
        .next()
        .unwrap_or(symbol)
        .trim()
        .to_uppercase()
}

/// Format a pair symbol from a bare ticker and quote asset: `BTC` + `USDT` -> `BTC/USDT`.
pub fn pair_symbol(symbol: &str, quote: &str) -> String {
    format!("{}/{}", normalize_symbol(symbol), quote.to_uppercase())
}
