//! End-to-end inference scenarios.
//!
//! Each test seeds an in-memory store with candles, runs every persona through
//! a `ScriptedModel`, then reads the outcome back through the consensus
//! aggregator the query surface uses.

use std::sync::Arc;

use augur_agents::test_support::{analysis_json, seed_candles, Reply, ScriptedModel};
use augur_agents::{ConsensusAggregator, InferenceRunner};
use augur_models::{AgentsConfig, Direction, PredictionQuery, Timeframe};
use augur_store::{retention_cutoff, Store};
use chrono::{Duration, Utc};

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn seeded_store(list: &[&str]) -> Arc<Store> {
    let store = Arc::new(Store::open_in_memory().unwrap());
    for symbol in list {
        seed_candles(&store, symbol, "binance", 60, Utc::now());
    }
    store
}

/// Model failure for persona A on symbol X leaves persona B on X and
/// persona A on Y unaffected within the same run.
#[tokio::test]
async fn persona_failure_is_isolated() {
    let store = seeded_store(&["BTC", "ETH"]);
    let model = Arc::new(
        ScriptedModel::always(Reply::text(analysis_json(Direction::Bullish, 75.0, Timeframe::Day)))
            .when(
                &["Value Investor", "Cryptocurrency: BTC"],
                Reply::Fail("upstream 503".to_string()),
            ),
    );
    let config = AgentsConfig::default();
    let runner = InferenceRunner::from_config(&config, "binance", model, store.clone());

    let report = runner.run(&symbols(&["BTC", "ETH"])).await;
    assert_eq!(report.recorded, 6);
    assert_eq!(report.failed, 0);

    let btc = store
        .query_predictions(&PredictionQuery::for_symbol("BTC"))
        .unwrap();
    let failed = btc.iter().find(|p| p.persona == "value_investor").unwrap();
    assert_eq!(failed.direction, Direction::Neutral);
    assert_eq!(failed.confidence, 0.0);
    assert!(failed.reasoning.contains("upstream 503"));

    let technical = btc.iter().find(|p| p.persona == "technical_analyst").unwrap();
    assert_eq!(technical.direction, Direction::Bullish);
    assert_eq!(technical.confidence, 75.0);

    let eth = store
        .query_predictions(&PredictionQuery::for_symbol("ETH"))
        .unwrap();
    let value_on_eth = eth.iter().find(|p| p.persona == "value_investor").unwrap();
    assert_eq!(value_on_eth.direction, Direction::Bullish);
}

#[tokio::test]
async fn consensus_reflects_latest_run() {
    let store = seeded_store(&["SOL"]);
    let model = Arc::new(
        ScriptedModel::always(Reply::text(analysis_json(Direction::Bearish, 40.0, Timeframe::Day)))
            .when(
                &["Technical Analyst"],
                Reply::text(analysis_json(Direction::Bullish, 80.0, Timeframe::Day)),
            )
            .when(
                &["Momentum Trader"],
                Reply::text(analysis_json(Direction::Bullish, 60.0, Timeframe::Day)),
            ),
    );
    let config = AgentsConfig::default();
    InferenceRunner::from_config(&config, "binance", model, store.clone())
        .run(&symbols(&["SOL"]))
        .await;

    let result = ConsensusAggregator::new(store, config.consensus_limit).consensus("SOL", Timeframe::Day);
    assert_eq!(result.consensus_direction, Direction::Bullish);
    assert!((result.consensus_confidence - 140.0 / 3.0).abs() < 1e-9);
    assert_eq!(
        (result.bullish_count, result.bearish_count, result.neutral_count),
        (2, 1, 0)
    );
    assert_eq!(result.total_count(), result.predictions.len());
}

#[tokio::test]
async fn missing_prices_record_neutral_without_model_calls() {
    let store = seeded_store(&["BTC"]);
    let model = Arc::new(ScriptedModel::always(Reply::text(analysis_json(
        Direction::Bullish,
        90.0,
        Timeframe::Day,
    ))));
    let config = AgentsConfig::default();
    let report = InferenceRunner::from_config(&config, "binance", model.clone(), store.clone())
        .run(&symbols(&["DOGE"]))
        .await;

    assert_eq!(report.recorded, 3);
    assert!(model.calls().is_empty());
    let result = ConsensusAggregator::new(store, 10).consensus("DOGE", Timeframe::Day);
    assert_eq!(result.consensus_direction, Direction::Neutral);
    assert_eq!(result.consensus_confidence, 0.0);
    assert_eq!(result.neutral_count, 3);
}

#[tokio::test]
async fn retention_retires_predictions_from_consensus() {
    let store = seeded_store(&["BTC"]);
    let model = Arc::new(ScriptedModel::always(Reply::text(analysis_json(
        Direction::Bullish,
        65.0,
        Timeframe::Day,
    ))));
    let config = AgentsConfig::default();
    InferenceRunner::from_config(&config, "binance", model, store.clone())
        .run(&symbols(&["BTC"]))
        .await;

    // A sweep 31 days from now puts every current row behind the cutoff.
    let report = store
        .sweep(retention_cutoff(Utc::now() + Duration::days(31), 30))
        .unwrap();
    assert_eq!(report.predictions_deactivated, 3);
    assert_eq!(report.candles_deleted, 60);

    let result = ConsensusAggregator::new(store, 10).consensus("BTC", Timeframe::Day);
    assert_eq!(result.total_count(), 0);
    assert_eq!(result.consensus_direction, Direction::Neutral);
}

/// A prediction write that fails for one persona is counted and logged; the
/// other personas' rows still land.
#[tokio::test]
async fn failed_write_does_not_stop_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("recorder.db");
    let path = db_path.to_str().unwrap();
    let store = Arc::new(Store::open(path).unwrap());
    seed_candles(&store, "BTC", "binance", 60, Utc::now());

    let admin = rusqlite::Connection::open(path).unwrap();
    admin
        .execute_batch(
            "CREATE TRIGGER reject_momentum BEFORE INSERT ON predictions \
             WHEN NEW.persona = 'momentum_trader' \
             BEGIN SELECT RAISE(ABORT, 'disk quota exceeded'); END;",
        )
        .unwrap();
    drop(admin);

    let model = Arc::new(ScriptedModel::always(Reply::text(analysis_json(
        Direction::Bearish,
        60.0,
        Timeframe::Day,
    ))));
    let config = AgentsConfig::default();
    let report = InferenceRunner::from_config(&config, "binance", model, store.clone())
        .run(&symbols(&["BTC"]))
        .await;

    assert_eq!(report.recorded, 2);
    assert_eq!(report.failed, 1);

    let mut personas: Vec<String> = store
        .query_predictions(&PredictionQuery::for_symbol("BTC"))
        .unwrap()
        .into_iter()
        .map(|p| p.persona)
        .collect();
    personas.sort();
    assert_eq!(personas, vec!["technical_analyst", "value_investor"]);
}
