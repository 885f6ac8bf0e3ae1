use std::sync::Arc;
use std::time::Duration;

use augur_models::{normalize_symbol, Candle, Prediction, PredictionQuery};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::StoreError;
use crate::memory::MemoryCache;
use crate::sqlite::Store;

/// Query surface consumed by read-side callers (the query CLI, an HTTP layer).
///
/// Latest-candle lookups go through a moka hot cache: moka (hot) → SQLite → None.
/// Candle range and prediction queries always hit SQLite.
pub struct StoreReader {
    store: Arc<Store>,
    latest: MemoryCache<(String, String), Candle>,
}

impl StoreReader {
    pub fn new(store: Arc<Store>, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            store,
            latest: MemoryCache::new(max_capacity, ttl),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The most recent candle for `(symbol, exchange)`.
    /// Promotes SQLite hits to the hot cache; misses are not cached.
    pub async fn latest_candle(
        &self,
        symbol: &str,
        exchange: &str,
    ) -> Result<Option<Candle>, StoreError> {
        let key = (normalize_symbol(symbol), exchange.to_string());
        if let Some(candle) = self.latest.get(&key).await {
            debug!(symbol = %key.0, exchange = %key.1, "Latest candle served from memory");
            return Ok(Some(candle));
        }

        let found = self.store.latest_candle(&key.0, &key.1)?;
        if let Some(candle) = &found {
            self.latest.insert(key, candle.clone()).await;
        }
        Ok(found)
    }

    /// Candles from the last `hours`, newest first.
    pub fn recent_candles(
        &self,
        symbol: &str,
        exchange: &str,
        hours: u32,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Candle>, StoreError> {
        let since = now - chrono::Duration::hours(hours as i64);
        self.store
            .candles_since(&normalize_symbol(symbol), exchange, since, limit)
    }

    pub fn predictions(&self, query: &PredictionQuery) -> Result<Vec<Prediction>, StoreError> {
        self.store.query_predictions(query)
    }
}
