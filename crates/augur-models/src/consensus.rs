use serde::{Deserialize, Serialize};

use crate::prediction::{Direction, Prediction, Timeframe};

/// Aggregated directional signal for one symbol and timeframe.
///
/// Derived on demand from active predictions; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsensusResult {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub consensus_direction: Direction,
    /// Winning direction's confidence sum divided by the number of predictions considered.
    pub consensus_confidence: f64,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub neutral_count: usize,
    pub predictions: Vec<Prediction>,
}

impl ConsensusResult {
    /// The defined result when no active predictions exist.
    pub fn empty(symbol: &str, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe,
            consensus_direction: Direction::Neutral,
            consensus_confidence: 0.0,
            bullish_count: 0,
            bearish_count: 0,
            neutral_count: 0,
            predictions: Vec::new(),
        }
    }

    pub fn total_count(&self) -> usize {
        self.bullish_count + self.bearish_count + self.neutral_count
    }
}
