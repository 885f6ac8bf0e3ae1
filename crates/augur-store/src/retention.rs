use chrono::{DateTime, Duration, Utc};
use rusqlite::TransactionBehavior;

use crate::error::StoreError;
use crate::sqlite::{to_millis, Store};

/// Outcome of one retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub candles_deleted: usize,
    pub predictions_deactivated: usize,
}

/// Cutoff instant for a retention window of `days` ending at `now`.
pub fn retention_cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(days as i64)
}

impl Store {
    /// Delete candles older than `cutoff` and deactivate predictions created
    /// before it, in a single transaction.
    ///
    /// Either both steps land or neither does. Sweeping unchanged data again
    /// reports zero rows.
    pub fn sweep(&self, cutoff: DateTime<Utc>) -> Result<SweepReport, StoreError> {
        let cutoff_ms = to_millis(cutoff);
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let candles_deleted = tx.execute(
            "DELETE FROM candles WHERE ts_ms < ?1",
            rusqlite::params![cutoff_ms],
        )?;
        let predictions_deactivated = tx.execute(
            "UPDATE predictions SET is_active = 0 WHERE created_at_ms < ?1 AND is_active = 1",
            rusqlite::params![cutoff_ms],
        )?;

        tx.commit()?;
        Ok(SweepReport {
            candles_deleted,
            predictions_deactivated,
        })
    }
}
