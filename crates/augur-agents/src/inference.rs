use std::sync::Arc;
use std::time::{Duration, Instant};

use augur_models::{normalize_symbol, AgentsConfig, Timeframe};
use augur_store::Store;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analyzer::{AnalyzerSettings, PersonaAnalyzer};
use crate::model::GenerativeModel;

/// Outcome of one inference run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Predictions written, including neutral fallbacks.
    pub recorded: usize,
    /// Persona/symbol/timeframe tasks that produced no prediction.
    pub failed: usize,
}

/// Fans every persona out over every symbol and timeframe and records the results.
///
/// All predictions of one run share a run id. Tasks are bounded by a
/// semaphore; a failure in one task never affects its siblings.
pub struct InferenceRunner {
    analyzers: Vec<Arc<PersonaAnalyzer>>,
    store: Arc<Store>,
    timeframes: Vec<Timeframe>,
    limiter: Arc<Semaphore>,
}

impl InferenceRunner {
    pub fn new(
        analyzers: Vec<Arc<PersonaAnalyzer>>,
        store: Arc<Store>,
        timeframes: Vec<Timeframe>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            analyzers,
            store,
            timeframes,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// One analyzer per enabled persona, all sharing `model`.
    pub fn from_config(
        config: &AgentsConfig,
        exchange: &str,
        model: Arc<dyn GenerativeModel>,
        store: Arc<Store>,
    ) -> Self {
        let settings = AnalyzerSettings {
            exchange: exchange.to_string(),
            lookback_hours: config.lookback_hours,
            max_candles: config.max_candles,
            call_timeout: Duration::from_secs(config.timeout_seconds),
        };
        let analyzers = config
            .enabled_personas()
            .map(|persona| {
                Arc::new(PersonaAnalyzer::new(
                    persona.clone(),
                    Arc::clone(&model),
                    Arc::clone(&store),
                    settings.clone(),
                ))
            })
            .collect();
        Self::new(analyzers, store, config.timeframes.clone(), config.max_concurrent)
    }

    pub fn persona_count(&self) -> usize {
        self.analyzers.len()
    }

    pub async fn run(&self, symbols: &[String]) -> RunReport {
        let run_id = Uuid::new_v4();
        let start = Instant::now();
        info!(
            run_id = %run_id,
            personas = self.analyzers.len(),
            symbols = symbols.len(),
            timeframes = self.timeframes.len(),
            "Starting inference run"
        );

        let mut tasks = JoinSet::new();
        for symbol in symbols {
            let symbol = normalize_symbol(symbol);
            for analyzer in &self.analyzers {
                for &timeframe in &self.timeframes {
                    let analyzer = Arc::clone(analyzer);
                    let store = Arc::clone(&self.store);
                    let limiter = Arc::clone(&self.limiter);
                    let symbol = symbol.clone();

                    tasks.spawn(async move {
                        let _permit = match limiter.acquire_owned().await {
                            Ok(permit) => permit,
                            Err(_) => return false,
                        };
                        let persona = analyzer.persona().id.clone();
                        let analysis = analyzer.analyze(&symbol, timeframe, Utc::now()).await;
                        match store.record_prediction(run_id, &persona, &symbol, &analysis, Utc::now())
                        {
                            Ok(prediction) => {
                                info!(
                                    run_id = %run_id,
                                    persona = %persona,
                                    symbol = %symbol,
                                    id = prediction.id,
                                    "Prediction recorded"
                                );
                                true
                            }
                            Err(e) => {
                                warn!(
                                    run_id = %run_id,
                                    persona = %persona,
                                    symbol = %symbol,
                                    error = %e,
                                    "Failed to record prediction"
                                );
                                false
                            }
                        }
                    });
                }
            }
        }

        let mut report = RunReport {
            run_id,
            recorded: 0,
            failed: 0,
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => report.recorded += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    error!(run_id = %run_id, error = %e, "Analysis task panicked");
                    report.failed += 1;
                }
            }
        }

        info!(
            run_id = %run_id,
            recorded = report.recorded,
            failed = report.failed,
            elapsed_ms = start.elapsed().as_millis(),
            "Inference run complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{analysis_json, seed_candles, Reply, ScriptedModel};
    use augur_models::{Direction, PredictionQuery};

    fn runner(model: Arc<ScriptedModel>, store: Arc<Store>, config: &AgentsConfig) -> InferenceRunner {
        InferenceRunner::from_config(config, "binance", model, store)
    }

    #[tokio::test]
    async fn records_one_prediction_per_persona_symbol_timeframe() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        seed_candles(&store, "BTC", "binance", 20, Utc::now());
        seed_candles(&store, "ETH", "binance", 20, Utc::now());
        let model = Arc::new(
            ScriptedModel::always(Reply::text(analysis_json(Direction::Bullish, 70.0, Timeframe::Day)))
                .when(&["for the 7d"], Reply::text(analysis_json(Direction::Bearish, 55.0, Timeframe::Week))),
        );
        let config = AgentsConfig {
            timeframes: vec![Timeframe::Day, Timeframe::Week],
            ..AgentsConfig::default()
        };

        let report = runner(model, store.clone(), &config)
            .run(&["BTC".to_string(), "eth/usdt".to_string()])
            .await;
        assert_eq!(report.recorded, 3 * 2 * 2);
        assert_eq!(report.failed, 0);

        let btc = store
            .query_predictions(&PredictionQuery::for_symbol("BTC"))
            .unwrap();
        assert_eq!(btc.len(), 6);
        assert!(btc.iter().all(|p| p.run_id == report.run_id));
        assert_eq!(
            btc.iter().filter(|p| p.timeframe == Timeframe::Week).count(),
            3
        );
        assert!(btc
            .iter()
            .filter(|p| p.timeframe == Timeframe::Week)
            .all(|p| p.direction == Direction::Bearish));
        assert_eq!(
            store.query_predictions(&PredictionQuery::for_symbol("ETH")).unwrap().len(),
            6
        );
    }

    #[tokio::test]
    async fn disabled_personas_are_skipped() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let mut config = AgentsConfig::default();
        config.personas[2].enabled = false;
        let runner = runner(Arc::new(ScriptedModel::failing("unused")), store, &config);
        assert_eq!(runner.persona_count(), 2);
    }

    #[tokio::test]
    async fn each_run_gets_a_fresh_run_id() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let config = AgentsConfig::default();
        let runner = runner(Arc::new(ScriptedModel::failing("unused")), store.clone(), &config);

        let first = runner.run(&["BTC".to_string()]).await;
        let second = runner.run(&["BTC".to_string()]).await;
        assert_ne!(first.run_id, second.run_id);
        // no candles: neutral fallbacks are still recorded
        assert_eq!(first.recorded, 3);
        assert_eq!(store.count_predictions().unwrap(), 6);
    }
}
