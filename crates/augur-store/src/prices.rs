use augur_models::Candle;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, TransactionBehavior};

use crate::error::StoreError;
use crate::sqlite::{from_millis, to_millis, Store};

const CANDLE_COLUMNS: &str = "symbol, exchange, ts_ms, open, high, low, close, volume";

fn candle_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Candle> {
    Ok(Candle {
        symbol: row.get(0)?,
        exchange: row.get(1)?,
        timestamp: from_millis(2, row.get(2)?)?,
        open: row.get(3)?,
        high: row.get(4)?,
        low: row.get(5)?,
        close: row.get(6)?,
        volume: row.get(7)?,
    })
}

impl Store {
    /// Persist one symbol's candle batch. Returns the number of new rows.
    ///
    /// Candles already present under `(symbol, exchange, timestamp)` are skipped.
    /// The UNIQUE constraint is the authoritative guard; the existence check only
    /// avoids a write. The batch commits in one transaction, so any failure leaves
    /// none of its rows behind.
    pub fn insert_candles(&self, symbol: &str, candles: &[Candle]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created_at = to_millis(Utc::now());
        let mut inserted = 0;
        {
            let mut exists = tx.prepare_cached(
                "SELECT 1 FROM candles WHERE symbol = ?1 AND exchange = ?2 AND ts_ms = ?3",
            )?;
            let mut insert = tx.prepare_cached(
                "INSERT OR IGNORE INTO candles \
                 (symbol, exchange, ts_ms, open, high, low, close, volume, created_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;

            for candle in candles {
                if candle.symbol != symbol {
                    return Err(StoreError::InvalidBatch(format!(
                        "candle for {} in batch for {symbol}",
                        candle.symbol
                    )));
                }
                let ts_ms = to_millis(candle.timestamp);
                if exists.exists(rusqlite::params![candle.symbol, candle.exchange, ts_ms])? {
                    continue;
                }
                inserted += insert.execute(rusqlite::params![
                    candle.symbol,
                    candle.exchange,
                    ts_ms,
                    candle.open,
                    candle.high,
                    candle.low,
                    candle.close,
                    candle.volume,
                    created_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Candles for `(symbol, exchange)` at or after `since`, newest first.
    pub fn candles_since(
        &self,
        symbol: &str,
        exchange: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Candle>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {CANDLE_COLUMNS} FROM candles \
             WHERE symbol = ?1 AND exchange = ?2 AND ts_ms >= ?3 \
             ORDER BY ts_ms DESC LIMIT ?4"
        ))?;
        let rows = stmt
            .query_map(
                rusqlite::params![symbol, exchange, to_millis(since), limit as i64],
                candle_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The single most recent candle for `(symbol, exchange)`.
    pub fn latest_candle(&self, symbol: &str, exchange: &str) -> Result<Option<Candle>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {CANDLE_COLUMNS} FROM candles \
             WHERE symbol = ?1 AND exchange = ?2 \
             ORDER BY ts_ms DESC LIMIT 1"
        ))?;
        Ok(stmt
            .query_row(rusqlite::params![symbol, exchange], candle_from_row)
            .optional()?)
    }

    /// Count all stored candles.
    pub fn count_candles(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM candles", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
