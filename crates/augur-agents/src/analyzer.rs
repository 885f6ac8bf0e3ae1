use std::sync::Arc;
use std::time::{Duration, Instant};

use augur_models::{normalize_symbol, Analysis, PersonaConfig, Timeframe};
use augur_store::Store;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::AgentError;
use crate::model::GenerativeModel;
use crate::parser::parse_analysis;
use crate::prompts::render_prompt;
use crate::summary::MarketSummary;

/// Inputs shared by every analyzer in a run.
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    /// Exchange whose candles are summarized.
    pub exchange: String,
    pub lookback_hours: u32,
    pub max_candles: usize,
    /// Upper bound on one model call, on top of any backend timeout.
    pub call_timeout: Duration,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            exchange: "binance".to_string(),
            lookback_hours: 24,
            max_candles: 100,
            call_timeout: Duration::from_secs(45),
        }
    }
}

/// One persona bound to a model and the price store.
pub struct PersonaAnalyzer {
    persona: PersonaConfig,
    model: Arc<dyn GenerativeModel>,
    store: Arc<Store>,
    settings: AnalyzerSettings,
}

impl PersonaAnalyzer {
    pub fn new(
        persona: PersonaConfig,
        model: Arc<dyn GenerativeModel>,
        store: Arc<Store>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            persona,
            model,
            store,
            settings,
        }
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    /// Produce exactly one analysis for `symbol` over `timeframe`.
    ///
    /// Never fails: an empty price window, a model error, a timeout or an
    /// invalid reply all degrade to neutral / 0 with the cause as reasoning.
    pub async fn analyze(&self, symbol: &str, timeframe: Timeframe, now: DateTime<Utc>) -> Analysis {
        let symbol = normalize_symbol(symbol);
        let start = Instant::now();

        match self.try_analyze(&symbol, timeframe, now).await {
            Ok(analysis) => {
                info!(
                    persona = %self.persona.id,
                    symbol = %symbol,
                    timeframe = %timeframe,
                    direction = %analysis.direction,
                    confidence = analysis.confidence,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Analysis complete"
                );
                analysis
            }
            Err(e) => {
                warn!(
                    persona = %self.persona.id,
                    symbol = %symbol,
                    timeframe = %timeframe,
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Analysis failed, recording neutral"
                );
                Analysis::neutral(timeframe, format!("Analysis failed: {e}"))
            }
        }
    }

    async fn try_analyze(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<Analysis, AgentError> {
        let since = now - chrono::Duration::hours(self.settings.lookback_hours as i64);
        let candles =
            self.store
                .candles_since(symbol, &self.settings.exchange, since, self.settings.max_candles)?;

        let Some(summary) = MarketSummary::from_candles(&candles) else {
            info!(persona = %self.persona.id, symbol = %symbol, "No recent price data, skipping model call");
            return Ok(Analysis::neutral(
                timeframe,
                format!(
                    "No recent price data available for {symbol} in the last {} hours.",
                    self.settings.lookback_hours
                ),
            ));
        };

        let prompt = render_prompt(&self.persona, symbol, &summary.render(), timeframe);
        let raw = tokio::time::timeout(self.settings.call_timeout, self.model.generate(&prompt))
            .await
            .map_err(|_| AgentError::Timeout(self.settings.call_timeout.as_secs()))??;

        parse_analysis(&raw, timeframe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{analysis_json, seed_candles, Reply, ScriptedModel};
    use augur_models::{default_personas, Direction};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn analyzer(model: Arc<ScriptedModel>, store: Arc<Store>) -> PersonaAnalyzer {
        PersonaAnalyzer::new(
            default_personas().remove(0),
            model,
            store,
            AnalyzerSettings::default(),
        )
    }

    #[tokio::test]
    async fn valid_reply_is_parsed() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        seed_candles(&store, "BTC", "binance", 30, now());
        let model = Arc::new(ScriptedModel::always(Reply::text(analysis_json(
            Direction::Bullish,
            81.0,
            Timeframe::Day,
        ))));

        let analysis = analyzer(model.clone(), store)
            .analyze("btc/usdt", Timeframe::Day, now())
            .await;
        assert_eq!(analysis.direction, Direction::Bullish);
        assert_eq!(analysis.confidence, 81.0);

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("Cryptocurrency: BTC"));
        assert!(calls[0].contains("Persona: Value Investor"));
        assert!(calls[0].contains("Candles: 30"));
    }

    #[tokio::test]
    async fn no_candles_skips_model() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let model = Arc::new(ScriptedModel::always(Reply::text(analysis_json(
            Direction::Bullish,
            90.0,
            Timeframe::Day,
        ))));

        let analysis = analyzer(model.clone(), store)
            .analyze("ETH", Timeframe::Day, now())
            .await;
        assert_eq!(analysis.direction, Direction::Neutral);
        assert_eq!(analysis.confidence, 0.0);
        assert!(analysis.reasoning.contains("No recent price data"));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn candles_outside_lookback_are_ignored() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        seed_candles(&store, "BTC", "binance", 10, now() - chrono::Duration::days(3));
        let model = Arc::new(ScriptedModel::failing("unreachable"));

        let analysis = analyzer(model.clone(), store)
            .analyze("BTC", Timeframe::Day, now())
            .await;
        assert!(analysis.reasoning.contains("No recent price data"));
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn model_error_degrades_to_neutral() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        seed_candles(&store, "BTC", "binance", 5, now());
        let model = Arc::new(ScriptedModel::failing("quota exceeded"));

        let analysis = analyzer(model, store)
            .analyze("BTC", Timeframe::Week, now())
            .await;
        assert_eq!(analysis.direction, Direction::Neutral);
        assert_eq!(analysis.confidence, 0.0);
        assert_eq!(analysis.timeframe, Timeframe::Week);
        assert!(analysis.reasoning.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn invalid_reply_degrades_to_neutral() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        seed_candles(&store, "BTC", "binance", 5, now());
        let model = Arc::new(ScriptedModel::always(Reply::text(
            r#"{"direction": "up", "confidence": 70, "timeframe": "24h"}"#,
        )));

        let analysis = analyzer(model, store).analyze("BTC", Timeframe::Day, now()).await;
        assert_eq!(analysis.direction, Direction::Neutral);
        assert_eq!(analysis.confidence, 0.0);
        assert!(analysis.reasoning.starts_with("Analysis failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_model_times_out() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        seed_candles(&store, "BTC", "binance", 5, now());
        let model = Arc::new(ScriptedModel::always(Reply::Hang));

        let analysis = analyzer(model, store).analyze("BTC", Timeframe::Day, now()).await;
        assert_eq!(analysis.direction, Direction::Neutral);
        assert!(analysis.reasoning.contains("timed out"));
    }

    #[tokio::test]
    async fn failed_gemini_call_keeps_key_out_of_reasoning() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        seed_candles(&store, "BTC", "binance", 5, now());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let model = crate::gemini::GeminiModel::new("SUPERSECRETKEY123", "gemini-1.5-flash", Duration::from_secs(5))
            .unwrap()
            .with_base_url(base_url);

        let analysis = PersonaAnalyzer::new(
            default_personas().remove(0),
            Arc::new(model),
            store,
            AnalyzerSettings::default(),
        )
        .analyze("BTC", Timeframe::Day, now())
        .await;
        assert_eq!(analysis.direction, Direction::Neutral);
        assert!(analysis.reasoning.starts_with("Analysis failed: HTTP error"));
        assert!(!analysis.reasoning.contains("SUPERSECRETKEY123"));
    }
}
