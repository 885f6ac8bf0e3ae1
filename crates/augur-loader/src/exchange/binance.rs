use std::time::Duration;

use async_trait::async_trait;
use augur_models::{CandleRow, Ticker};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{Exchange, FetchError};
use crate::config::ExchangeConfig;

/// Binance public REST API. No credentials; market data endpoints only.
pub struct BinanceExchange {
    http: Client,
    name: String,
    base_url: String,
}

impl BinanceExchange {
    pub fn new(config: &ExchangeConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("augur-loader/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            name: config.name.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `BTC/USDT` -> `BTCUSDT`
    fn market_symbol(pair: &str) -> String {
        pair.replace('/', "").to_uppercase()
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Exchange request");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(timeout_or_http)?;
        let status = response.status();

        // 418 is Binance's escalation after ignored 429s
        if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            return Err(FetchError::RateLimited { retry_after_ms });
        }

        let body = response.text().await.map_err(timeout_or_http)?;
        if !status.is_success() {
            let body = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("msg").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(format!("invalid JSON: {e}")))
    }
}

fn timeout_or_http(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(e)
    }
}

/// Binance encodes prices as strings; accept either form.
fn number(value: &Value, field: &str) -> Result<f64, FetchError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::Malformed(format!("{field} is not a number: {value}")))
}

/// Decode a `/api/v3/klines` body: `[[open_time, o, h, l, c, v, ...], ...]`.
pub fn parse_klines(body: &Value) -> Result<Vec<CandleRow>, FetchError> {
    let rows = body
        .as_array()
        .ok_or_else(|| FetchError::Malformed("klines body is not an array".to_string()))?;

    rows.iter()
        .map(|row| {
            let fields = row
                .as_array()
                .filter(|f| f.len() >= 6)
                .ok_or_else(|| FetchError::Malformed(format!("short kline row: {row}")))?;
            let timestamp_ms = fields[0]
                .as_i64()
                .ok_or_else(|| FetchError::Malformed(format!("bad open time: {}", fields[0])))?;
            Ok(CandleRow {
                timestamp_ms,
                open: number(&fields[1], "open")?,
                high: number(&fields[2], "high")?,
                low: number(&fields[3], "low")?,
                close: number(&fields[4], "close")?,
                volume: number(&fields[5], "volume")?,
            })
        })
        .collect()
}

/// Decode a `/api/v3/ticker/24hr` body for a single symbol.
pub fn parse_ticker(pair: &str, body: &Value) -> Result<Ticker, FetchError> {
    let field = |name: &str| {
        body.get(name)
            .ok_or_else(|| FetchError::Malformed(format!("ticker missing {name}")))
            .and_then(|v| number(v, name))
    };
    let timestamp = body
        .get("closeTime")
        .and_then(Value::as_i64)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(Utc::now);

    Ok(Ticker {
        pair: pair.to_string(),
        last_price: field("lastPrice")?,
        high_24h: field("highPrice")?,
        low_24h: field("lowPrice")?,
        volume_24h: field("volume")?,
        change_percent_24h: field("priceChangePercent")?,
        timestamp,
    })
}

#[async_trait]
impl Exchange for BinanceExchange {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_candles(
        &self,
        pair: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<CandleRow>, FetchError> {
        let body = self
            .get_json(
                "/api/v3/klines",
                &[
                    ("symbol", Self::market_symbol(pair)),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        let mut rows = parse_klines(&body)?;
        rows.sort_by_key(|r| r.timestamp_ms);
        Ok(rows)
    }

    async fn fetch_ticker(&self, pair: &str) -> Result<Ticker, FetchError> {
        let body = self
            .get_json("/api/v3/ticker/24hr", &[("symbol", Self::market_symbol(pair))])
            .await?;
        parse_ticker(pair, &body)
    }
}
