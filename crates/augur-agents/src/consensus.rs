use std::sync::Arc;

use augur_models::{normalize_symbol, ConsensusResult, Direction, Prediction, Timeframe};
use augur_store::Store;
use tracing::{debug, error};

/// Order in which equal confidence sums are resolved: earlier wins.
pub const TIE_BREAK_PRIORITY: [Direction; 3] =
    [Direction::Bullish, Direction::Bearish, Direction::Neutral];

/// Combine predictions into one directional signal.
///
/// The winning direction has the largest confidence sum, ties resolved by
/// [`TIE_BREAK_PRIORITY`]. Only directions with at least one prediction are
/// candidates, so a panel of zero-confidence neutral calls stays neutral.
/// Its confidence is that sum divided by the number of
/// predictions considered, so it stays within [0, 100].
pub fn compute_consensus(
    symbol: &str,
    timeframe: Timeframe,
    predictions: Vec<Prediction>,
) -> ConsensusResult {
    if predictions.is_empty() {
        return ConsensusResult::empty(symbol, timeframe);
    }

    let mut counts = [0usize; 3];
    let mut sums = [0f64; 3];
    let slot = |d: Direction| match d {
        Direction::Bullish => 0,
        Direction::Bearish => 1,
        Direction::Neutral => 2,
    };
    for p in &predictions {
        counts[slot(p.direction)] += 1;
        sums[slot(p.direction)] += p.confidence;
    }

    let mut winner: Option<Direction> = None;
    for candidate in TIE_BREAK_PRIORITY {
        if counts[slot(candidate)] == 0 {
            continue;
        }
        match winner {
            Some(current) if sums[slot(candidate)] <= sums[slot(current)] => {}
            _ => winner = Some(candidate),
        }
    }
    let winner = winner.unwrap_or(Direction::Neutral);

    ConsensusResult {
        symbol: symbol.to_string(),
        timeframe,
        consensus_direction: winner,
        consensus_confidence: sums[slot(winner)] / predictions.len() as f64,
        bullish_count: counts[0],
        bearish_count: counts[1],
        neutral_count: counts[2],
        predictions,
    }
}

/// Reads the most recent active predictions and folds them into a consensus.
pub struct ConsensusAggregator {
    store: Arc<Store>,
    limit: usize,
}

impl ConsensusAggregator {
    pub fn new(store: Arc<Store>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Never fails: a store error is logged and yields the empty result.
    pub fn consensus(&self, symbol: &str, timeframe: Timeframe) -> ConsensusResult {
        let symbol = normalize_symbol(symbol);
        match self.store.active_predictions(&symbol, timeframe, self.limit) {
            Ok(predictions) => {
                debug!(symbol = %symbol, timeframe = %timeframe, considered = predictions.len(), "Computing consensus");
                compute_consensus(&symbol, timeframe, predictions)
            }
            Err(e) => {
                error!(symbol = %symbol, timeframe = %timeframe, error = %e, "Consensus read failed");
                ConsensusResult::empty(&symbol, timeframe)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_models::Analysis;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn prediction(direction: Direction, confidence: f64) -> Prediction {
        Prediction {
            id: 0,
            run_id: Uuid::nil(),
            persona: "value_investor".to_string(),
            symbol: "BTC".to_string(),
            direction,
            confidence,
            timeframe: Timeframe::Day,
            reasoning: String::new(),
            created_at: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn majority_confidence_wins() {
        let result = compute_consensus(
            "BTC",
            Timeframe::Day,
            vec![
                prediction(Direction::Bullish, 80.0),
                prediction(Direction::Bullish, 60.0),
                prediction(Direction::Bearish, 40.0),
            ],
        );
        assert_eq!(result.consensus_direction, Direction::Bullish);
        assert!((result.consensus_confidence - 46.666_666).abs() < 1e-3);
        assert_eq!(
            (result.bullish_count, result.bearish_count, result.neutral_count),
            (2, 1, 0)
        );
        assert_eq!(result.total_count(), result.predictions.len());
    }

    #[test]
    fn empty_input_is_neutral_zero() {
        let result = compute_consensus("ETH", Timeframe::Week, Vec::new());
        assert_eq!(result, ConsensusResult::empty("ETH", Timeframe::Week));
    }

    #[test]
    fn ties_follow_priority() {
        let result = compute_consensus(
            "BTC",
            Timeframe::Day,
            vec![
                prediction(Direction::Bullish, 50.0),
                prediction(Direction::Bearish, 50.0),
            ],
        );
        assert_eq!(result.consensus_direction, Direction::Bullish);
        assert_eq!(result.consensus_confidence, 25.0);

        let three_way = compute_consensus(
            "BTC",
            Timeframe::Day,
            vec![
                prediction(Direction::Bullish, 30.0),
                prediction(Direction::Bearish, 30.0),
                prediction(Direction::Neutral, 30.0),
            ],
        );
        assert_eq!(three_way.consensus_direction, Direction::Bullish);

        let bearish_over_neutral = compute_consensus(
            "BTC",
            Timeframe::Day,
            vec![
                prediction(Direction::Neutral, 45.0),
                prediction(Direction::Bearish, 45.0),
            ],
        );
        assert_eq!(bearish_over_neutral.consensus_direction, Direction::Bearish);
    }

    #[test]
    fn zero_confidence_predictions_fall_to_priority() {
        let result = compute_consensus(
            "BTC",
            Timeframe::Day,
            vec![
                prediction(Direction::Neutral, 0.0),
                prediction(Direction::Bearish, 0.0),
            ],
        );
        assert_eq!(result.consensus_direction, Direction::Bearish);
        assert_eq!(result.consensus_confidence, 0.0);

        let all_neutral: Vec<_> = (0..3).map(|_| prediction(Direction::Neutral, 0.0)).collect();
        let result = compute_consensus("BTC", Timeframe::Day, all_neutral);
        assert_eq!(result.consensus_direction, Direction::Neutral);
    }

    #[test]
    fn confidence_stays_in_range() {
        let all_max: Vec<_> = (0..7).map(|_| prediction(Direction::Bearish, 100.0)).collect();
        let result = compute_consensus("BTC", Timeframe::Day, all_max);
        assert_eq!(result.consensus_confidence, 100.0);
    }

    #[test]
    fn aggregator_uses_latest_active_window() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let now = Utc::now();
        let record = |direction, confidence, age_minutes: i64| {
            store
                .record_prediction(
                    Uuid::new_v4(),
                    "technical_analyst",
                    "SOL",
                    &Analysis {
                        direction,
                        confidence,
                        timeframe: Timeframe::Day,
                        reasoning: String::new(),
                    },
                    now - Duration::minutes(age_minutes),
                )
                .unwrap();
        };
        // Two old bearish calls fall outside a window of two.
        record(Direction::Bearish, 90.0, 30);
        record(Direction::Bearish, 90.0, 20);
        record(Direction::Bullish, 70.0, 10);
        record(Direction::Bullish, 50.0, 5);

        let aggregator = ConsensusAggregator::new(store.clone(), 2);
        let result = aggregator.consensus("sol/usdt", Timeframe::Day);
        assert_eq!(result.symbol, "SOL");
        assert_eq!(result.consensus_direction, Direction::Bullish);
        assert_eq!(result.consensus_confidence, 60.0);
        assert_eq!(result.predictions.len(), 2);

        let other = aggregator.consensus("SOL", Timeframe::Month);
        assert_eq!(other, ConsensusResult::empty("SOL", Timeframe::Month));
    }
}
