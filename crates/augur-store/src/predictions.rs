use augur_models::{Analysis, Prediction, PredictionQuery, Timeframe};
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::TransactionBehavior;
use uuid::Uuid;

use crate::error::StoreError;
use crate::sqlite::{from_millis, to_millis, Store};

const PREDICTION_COLUMNS: &str =
    "id, run_id, persona, symbol, direction, confidence, timeframe, reasoning, created_at_ms, is_active";

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn prediction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Prediction> {
    let run_id: String = row.get(1)?;
    let direction: String = row.get(4)?;
    let timeframe: String = row.get(6)?;
    Ok(Prediction {
        id: row.get(0)?,
        run_id: Uuid::parse_str(&run_id).map_err(|e| conversion_error(1, e.to_string()))?,
        persona: row.get(2)?,
        symbol: row.get(3)?,
        direction: direction.parse().map_err(|e| conversion_error(4, e))?,
        confidence: row.get(5)?,
        timeframe: timeframe.parse().map_err(|e| conversion_error(6, e))?,
        reasoning: row.get(7)?,
        created_at: from_millis(8, row.get(8)?)?,
        is_active: row.get(9)?,
    })
}

impl Store {
    /// Record one persona's analysis as a new active prediction.
    ///
    /// Prior predictions are left untouched; "current" is decided at query time.
    pub fn record_prediction(
        &self,
        run_id: Uuid,
        persona: &str,
        symbol: &str,
        analysis: &Analysis,
        created_at: DateTime<Utc>,
    ) -> Result<Prediction, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO predictions \
             (run_id, persona, symbol, direction, confidence, timeframe, reasoning, created_at_ms, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
            rusqlite::params![
                run_id.to_string(),
                persona,
                symbol,
                analysis.direction.as_str(),
                analysis.confidence,
                analysis.timeframe.as_str(),
                analysis.reasoning,
                to_millis(created_at),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Prediction {
            id,
            run_id,
            persona: persona.to_string(),
            symbol: symbol.to_string(),
            direction: analysis.direction,
            confidence: analysis.confidence,
            timeframe: analysis.timeframe,
            reasoning: analysis.reasoning.clone(),
            created_at,
            is_active: true,
        })
    }

    /// Query predictions newest first, filtered per [`PredictionQuery`].
    pub fn query_predictions(&self, query: &PredictionQuery) -> Result<Vec<Prediction>, StoreError> {
        let mut sql = format!("SELECT {PREDICTION_COLUMNS} FROM predictions WHERE symbol = ?1");
        let mut params: Vec<Value> = vec![Value::Text(query.symbol.clone())];

        if let Some(persona) = &query.persona {
            params.push(Value::Text(persona.clone()));
            sql.push_str(&format!(" AND persona = ?{}", params.len()));
        }
        if let Some(timeframe) = query.timeframe {
            params.push(Value::Text(timeframe.as_str().to_string()));
            sql.push_str(&format!(" AND timeframe = ?{}", params.len()));
        }
        if query.active_only {
            sql.push_str(" AND is_active = 1");
        }
        params.push(Value::Integer(query.limit as i64));
        sql.push_str(&format!(
            " ORDER BY created_at_ms DESC, id DESC LIMIT ?{}",
            params.len()
        ));

        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params), prediction_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The most recent active predictions for a symbol and timeframe.
    pub fn active_predictions(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Prediction>, StoreError> {
        self.query_predictions(&PredictionQuery {
            symbol: symbol.to_string(),
            persona: None,
            timeframe: Some(timeframe),
            active_only: true,
            limit,
        })
    }

    /// Count all stored predictions, active or not.
    pub fn count_predictions(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_models::Direction;
    use chrono::Duration;

    fn analysis(direction: Direction, confidence: f64, timeframe: Timeframe) -> Analysis {
        Analysis {
            direction,
            confidence,
            timeframe,
            reasoning: format!("{direction} at {confidence}"),
        }
    }

    #[test]
    fn record_returns_active_prediction() {
        let store = Store::open_in_memory().unwrap();
        let run = Uuid::new_v4();
        let now = Utc::now();
        let recorded = store
            .record_prediction(
                run,
                "value_investor",
                "BTC",
                &analysis(Direction::Bullish, 72.5, Timeframe::Day),
                now,
            )
            .unwrap();

        assert!(recorded.id > 0);
        assert!(recorded.is_active);

        let fetched = store
            .query_predictions(&PredictionQuery::for_symbol("BTC"))
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].run_id, run);
        assert_eq!(fetched[0].direction, Direction::Bullish);
        assert_eq!(fetched[0].confidence, 72.5);
        assert_eq!(fetched[0].timeframe, Timeframe::Day);
        assert_eq!(fetched[0].created_at.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn recording_never_mutates_prior_rows() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now();
        for i in 0..3 {
            store
                .record_prediction(
                    Uuid::new_v4(),
                    "technical_analyst",
                    "ETH",
                    &analysis(Direction::Bearish, 40.0 + i as f64, Timeframe::Day),
                    now + Duration::seconds(i),
                )
                .unwrap();
        }
        let all = store
            .query_predictions(&PredictionQuery::for_symbol("ETH"))
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|p| p.is_active));
        // newest first
        assert_eq!(all[0].confidence, 42.0);
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let result = store.record_prediction(
            Uuid::new_v4(),
            "momentum_trader",
            "SOL",
            &analysis(Direction::Bullish, 140.0, Timeframe::Day),
            Utc::now(),
        );
        assert!(result.is_err());
        assert_eq!(store.count_predictions().unwrap(), 0);
    }

    #[test]
    fn query_filters_by_persona_timeframe_and_limit() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now();
        let rows = [
            ("value_investor", Timeframe::Day),
            ("value_investor", Timeframe::Week),
            ("technical_analyst", Timeframe::Day),
            ("technical_analyst", Timeframe::Day),
        ];
        for (i, (persona, timeframe)) in rows.iter().enumerate() {
            store
                .record_prediction(
                    Uuid::new_v4(),
                    persona,
                    "BTC",
                    &analysis(Direction::Neutral, 10.0, *timeframe),
                    now + Duration::seconds(i as i64),
                )
                .unwrap();
        }

        let mut query = PredictionQuery::for_symbol("BTC");
        query.persona = Some("value_investor".to_string());
        assert_eq!(store.query_predictions(&query).unwrap().len(), 2);

        query.timeframe = Some(Timeframe::Week);
        assert_eq!(store.query_predictions(&query).unwrap().len(), 1);

        let day = store.active_predictions("BTC", Timeframe::Day, 2).unwrap();
        assert_eq!(day.len(), 2);
        assert!(day.iter().all(|p| p.persona == "technical_analyst"));
    }
}
