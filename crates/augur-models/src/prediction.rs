use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directional call made by a persona.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Bullish, Direction::Bearish, Direction::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Ok(Direction::Bullish),
            "bearish" => Ok(Direction::Bearish),
            "neutral" => Ok(Direction::Neutral),
            other => Err(format!("unknown direction: {other:?}")),
        }
    }
}

/// Prediction horizon.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Day, Timeframe::Week, Timeframe::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(Timeframe::Day),
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            other => Err(format!("unknown timeframe: {other:?}")),
        }
    }
}

/// Validated output of one persona analysis, before it is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    pub direction: Direction,
    /// 0 to 100 inclusive.
    pub confidence: f64,
    pub timeframe: Timeframe,
    pub reasoning: String,
}

impl Analysis {
    /// Neutral, zero-confidence result used whenever an analysis cannot complete.
    pub fn neutral(timeframe: Timeframe, reasoning: impl Into<String>) -> Self {
        Self {
            direction: Direction::Neutral,
            confidence: 0.0,
            timeframe,
            reasoning: reasoning.into(),
        }
    }
}

/// A recorded persona prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub id: i64,
    pub run_id: Uuid,
    pub persona: String,
    pub symbol: String,
    pub direction: Direction,
    pub confidence: f64,
    pub timeframe: Timeframe,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Filter for the prediction query surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionQuery {
    pub symbol: String,
    pub persona: Option<String>,
    pub timeframe: Option<Timeframe>,
    pub active_only: bool,
    pub limit: usize,
}

impl PredictionQuery {
    pub const DEFAULT_LIMIT: usize = 50;

    pub fn for_symbol(symbol: &str) -> Self {
        Self {
            symbol: crate::candle::normalize_symbol(symbol),
            persona: None,
            timeframe: None,
            active_only: true,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}
