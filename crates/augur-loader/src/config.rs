use std::collections::HashSet;

use augur_models::{AgentsConfig, StoreConfig};
use serde::{Deserialize, Serialize};

use crate::error::LoaderError;

/// Floor for the exchange request gate.
pub const MIN_REQUEST_INTERVAL_MS: u64 = 1_000;
/// Largest candle window a persona may be shown.
pub const MAX_PERSONA_CANDLES: usize = 100;

/// Full daemon configuration. The `[store]` and `[agents]` sections are shared
/// with the query CLI; the rest is loader-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeConfig {
    /// Tag stored on every candle; must match `store.primary_exchange` for
    /// the personas to see the data.
    #[serde(default = "default_exchange_name")]
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Quote asset appended to every tracked symbol.
    #[serde(default = "default_quote")]
    pub quote: String,
    /// Candle interval requested from the exchange.
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_candle_limit")]
    pub candle_limit: u32,
    /// Minimum delay between consecutive exchange requests.
    #[serde(default = "default_min_request_interval")]
    pub min_request_interval_ms: u64,
    /// Per-request timeout.
    #[serde(default = "default_exchange_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            name: default_exchange_name(),
            base_url: default_base_url(),
            quote: default_quote(),
            interval: default_interval(),
            candle_limit: default_candle_limit(),
            min_request_interval_ms: default_min_request_interval(),
            timeout_seconds: default_exchange_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestionConfig {
    #[serde(default = "default_ingestion_interval")]
    pub interval_seconds: u64,
    /// Bare tickers to fetch candles for (`BTC`, not `BTC/USDT`).
    #[serde(default = "default_ingestion_symbols")]
    pub symbols: Vec<String>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_ingestion_interval(),
            symbols: default_ingestion_symbols(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceConfig {
    /// Run at minute 0 of every hour divisible by this value (UTC).
    #[serde(default = "default_inference_every_hours")]
    pub every_hours: u32,
    #[serde(default = "default_inference_symbols")]
    pub symbols: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            every_hours: default_inference_every_hours(),
            symbols: default_inference_symbols(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_days")]
    pub days: u32,
    /// Daily sweep time, UTC.
    #[serde(default = "default_retention_hour")]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: default_retention_days(),
            hour: default_retention_hour(),
            minute: 0,
        }
    }
}

impl LoaderConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml(input: &str) -> Result<Self, LoaderError> {
        let config: LoaderConfig =
            toml::from_str(input).map_err(|e| LoaderError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the daemon cannot run with. Called once at start-up.
    pub fn validate(&self) -> Result<(), LoaderError> {
        let fail = |msg: &str| Err(LoaderError::Config(msg.to_string()));

        if self.ingestion.symbols.is_empty() {
            return fail("ingestion.symbols must not be empty");
        }
        if self.inference.symbols.is_empty() {
            return fail("inference.symbols must not be empty");
        }
        if self.ingestion.interval_seconds == 0 {
            return fail("ingestion.interval_seconds must be positive");
        }
        if self.inference.every_hours == 0 || self.inference.every_hours > 24 {
            return fail("inference.every_hours must be between 1 and 24");
        }
        if self.retention.days == 0 {
            return fail("retention.days must be positive");
        }
        if self.retention.hour > 23 || self.retention.minute > 59 {
            return fail("retention time must be a valid HH:MM");
        }
        if self.exchange.candle_limit == 0 {
            return fail("exchange.candle_limit must be positive");
        }
        if self.exchange.min_request_interval_ms < MIN_REQUEST_INTERVAL_MS {
            return Err(LoaderError::Config(format!(
                "exchange.min_request_interval_ms must be at least {MIN_REQUEST_INTERVAL_MS}"
            )));
        }
        if !(1..=MAX_PERSONA_CANDLES).contains(&self.agents.max_candles) {
            return Err(LoaderError::Config(format!(
                "agents.max_candles must be between 1 and {MAX_PERSONA_CANDLES}"
            )));
        }
        if self.agents.timeframes.is_empty() {
            return fail("agents.timeframes must not be empty");
        }
        if self.agents.max_concurrent == 0 {
            return fail("agents.max_concurrent must be positive");
        }

        let mut seen = HashSet::new();
        for persona in &self.agents.personas {
            if persona.id.trim().is_empty() {
                return fail("persona id must not be empty");
            }
            if !seen.insert(persona.id.as_str()) {
                return Err(LoaderError::Config(format!(
                    "duplicate persona id: {}",
                    persona.id
                )));
            }
        }
        if self.agents.enabled_personas().next().is_none() {
            return fail("at least one persona must be enabled");
        }
        Ok(())
    }
}

fn default_exchange_name() -> String {
    "binance".to_string()
}
fn default_base_url() -> String {
    "https://api.binance.com".to_string()
}
fn default_quote() -> String {
    "USDT".to_string()
}
fn default_interval() -> String {
    "1m".to_string()
}
fn default_candle_limit() -> u32 {
    100
}
fn default_min_request_interval() -> u64 {
    1_000
}
fn default_exchange_timeout() -> u64 {
    10
}
fn default_ingestion_interval() -> u64 {
    60
}
fn default_ingestion_symbols() -> Vec<String> {
    ["BTC", "ETH", "BNB", "XRP", "SOL", "ADA", "DOGE", "AVAX", "DOT", "MATIC"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_inference_every_hours() -> u32 {
    4
}
fn default_inference_symbols() -> Vec<String> {
    ["BTC", "ETH", "BNB", "SOL", "XRP"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_retention_days() -> u32 {
    30
}
fn default_retention_hour() -> u32 {
    2
}
