//! Augur - multi-persona crypto market predictions
//!
//! Candles are ingested from an exchange by `augur-loader`, a panel of
//! personas turns them into directional predictions, and this crate reads
//! both back out: raw prices, the prediction log, and the consensus signal.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use augur::models::{AugurConfig, Timeframe};
//! use augur::QueryService;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config: AugurConfig = toml::from_str(&std::fs::read_to_string("config/augur.toml")?)?;
//! let service = QueryService::from_config(&config)?;
//! let consensus = service.consensus("BTC", Timeframe::Day);
//! println!("{:?} at {:.1}", consensus.consensus_direction, consensus.consensus_confidence);
//! # Ok(())
//! # }
//! ```

pub use augur_agents as agents;
pub use augur_models as models;
pub use augur_store as store;

use std::sync::Arc;
use std::time::Duration;

use augur_agents::ConsensusAggregator;
use augur_models::{AugurConfig, Candle, ConsensusResult, Prediction, PredictionQuery, Timeframe};
use augur_store::{Store, StoreError, StoreReader};
use chrono::Utc;

/// Upper bound on candles returned by a price query.
pub const PRICE_QUERY_LIMIT: usize = 1000;

/// Read-only access to everything the loader has written.
pub struct QueryService {
    reader: StoreReader,
    aggregator: ConsensusAggregator,
    exchange: String,
}

impl QueryService {
    /// Open the configured SQLite store.
    pub fn from_config(config: &AugurConfig) -> Result<Self, StoreError> {
        let store = Arc::new(Store::open(&config.store.sqlite_path)?);
        Ok(Self::new(store, config))
    }

    pub fn new(store: Arc<Store>, config: &AugurConfig) -> Self {
        let reader = StoreReader::new(
            Arc::clone(&store),
            config.store.hot_cache_capacity,
            Duration::from_secs(config.store.hot_cache_ttl_seconds),
        );
        Self {
            reader,
            aggregator: ConsensusAggregator::new(store, config.agents.consensus_limit),
            exchange: config.store.primary_exchange.clone(),
        }
    }

    pub fn consensus(&self, symbol: &str, timeframe: Timeframe) -> ConsensusResult {
        self.aggregator.consensus(symbol, timeframe)
    }

    pub fn predictions(&self, query: &PredictionQuery) -> Result<Vec<Prediction>, StoreError> {
        self.reader.predictions(query)
    }

    pub fn primary_exchange(&self) -> &str {
        &self.exchange
    }

    /// Candles from the last `hours` on the primary exchange, newest first.
    pub fn prices(&self, symbol: &str, hours: u32) -> Result<Vec<Candle>, StoreError> {
        self.prices_on(symbol, &self.exchange, hours)
    }

    pub fn prices_on(
        &self,
        symbol: &str,
        exchange: &str,
        hours: u32,
    ) -> Result<Vec<Candle>, StoreError> {
        self.reader
            .recent_candles(symbol, exchange, hours, PRICE_QUERY_LIMIT, Utc::now())
    }

    pub async fn latest(&self, symbol: &str) -> Result<Option<Candle>, StoreError> {
        self.latest_on(symbol, &self.exchange).await
    }

    pub async fn latest_on(&self, symbol: &str, exchange: &str) -> Result<Option<Candle>, StoreError> {
        self.reader.latest_candle(symbol, exchange).await
    }
}
