//! Test support: scripted generative models and price-store seeding.
//!
//! `ScriptedModel` answers prompts by substring rules, so a test can make one
//! persona or one symbol fail while the rest of a run succeeds.

use std::sync::Mutex;

use async_trait::async_trait;
use augur_models::{Candle, Direction, Timeframe};
use augur_store::Store;
use chrono::{DateTime, Duration, DurationRound, Utc};

use crate::error::AgentError;
use crate::model::GenerativeModel;

/// What a scripted model does for a matching prompt.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Never resolves; exercises call timeouts.
    Hang,
}

impl Reply {
    pub fn text(body: impl Into<String>) -> Self {
        Reply::Text(body.into())
    }
}

/// A model whose replies are chosen by substring rules over the prompt.
///
/// Rules are checked in insertion order; a rule matches when every needle
/// appears in the prompt. Unmatched prompts get the fallback reply.
pub struct ScriptedModel {
    rules: Vec<(Vec<String>, Reply)>,
    fallback: Reply,
    calls: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn always(reply: Reply) -> Self {
        Self {
            rules: Vec::new(),
            fallback: reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self::always(Reply::Fail(message.to_string()))
    }

    pub fn when(mut self, needles: &[&str], reply: Reply) -> Self {
        self.rules
            .push((needles.iter().map(|n| n.to_string()).collect(), reply));
        self
    }

    /// Every prompt received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn reply_for(&self, prompt: &str) -> Reply {
        self.rules
            .iter()
            .find(|(needles, _)| needles.iter().all(|n| prompt.contains(n.as_str())))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt.to_string());
        }
        match self.reply_for(prompt) {
            Reply::Text(body) => Ok(body),
            Reply::Fail(message) => Err(AgentError::Api(message)),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// A fenced JSON reply in the shape personas are asked to produce.
pub fn analysis_json(direction: Direction, confidence: f64, timeframe: Timeframe) -> String {
    format!(
        "Here is my call:\n```json\n{}\n```",
        serde_json::json!({
            "direction": direction.as_str(),
            "confidence": confidence,
            "timeframe": timeframe.as_str(),
            "reasoning": format!("scripted {direction} call"),
        })
    )
}

/// Insert `count` one-minute candles for `symbol` ending at `end` (truncated to the minute).
/// Closes rise by one per minute from 100.
pub fn seed_candles(store: &Store, symbol: &str, exchange: &str, count: usize, end: DateTime<Utc>) {
    let end = end.duration_trunc(Duration::minutes(1)).unwrap_or(end);
    let candles: Vec<Candle> = (0..count)
        .map(|i| {
            let close = 100.0 + i as f64;
            Candle {
                symbol: symbol.to_string(),
                exchange: exchange.to_string(),
                timestamp: end - Duration::minutes((count - 1 - i) as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10.0 + i as f64,
            }
        })
        .collect();
    if let Err(e) = store.insert_candles(symbol, &candles) {
        panic!("seeding candles for {symbol} failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rules_match_in_order_with_fallback() {
        let model = ScriptedModel::always(Reply::text("fallback"))
            .when(&["Value Investor", "BTC"], Reply::Fail("boom".to_string()))
            .when(&["BTC"], Reply::text("btc"));

        assert!(model.generate("Value Investor on BTC").await.is_err());
        assert_eq!(model.generate("Momentum on BTC").await.unwrap(), "btc");
        assert_eq!(model.generate("Momentum on ETH").await.unwrap(), "fallback");
        assert_eq!(model.calls().len(), 3);
    }

    #[test]
    fn seeded_candles_are_valid_and_minute_aligned() {
        let store = Store::open_in_memory().unwrap();
        let end = Utc::now();
        seed_candles(&store, "SOL", "binance", 15, end);
        let rows = store
            .candles_since("SOL", "binance", end - Duration::hours(1), 100)
            .unwrap();
        assert_eq!(rows.len(), 15);
        assert!(rows.iter().all(|c| c.validate().is_ok()));
    }
}
