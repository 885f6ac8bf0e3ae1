use serde::{Deserialize, Serialize};

use crate::persona::{default_personas, PersonaConfig};
use crate::prediction::Timeframe;

/// Configuration shared by the loader daemon and the query CLI.
///
/// Both binaries read the same TOML file; sections they don't know are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AugurConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
}

/// Configuration for the SQLite store and its hot read cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database holding candles and predictions.
    pub sqlite_path: String,
    /// Exchange tag whose candles feed the persona analyzers.
    #[serde(default = "default_primary_exchange")]
    pub primary_exchange: String,
    /// Maximum number of entries in the in-memory moka cache.
    #[serde(default = "default_hot_capacity")]
    pub hot_cache_capacity: u64,
    /// How long a latest-candle read stays in memory.
    #[serde(default = "default_hot_ttl")]
    pub hot_cache_ttl_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "data/augur.db".to_string(),
            primary_exchange: default_primary_exchange(),
            hot_cache_capacity: default_hot_capacity(),
            hot_cache_ttl_seconds: default_hot_ttl(),
        }
    }
}

/// Which generative-text backend the personas talk to.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    #[default]
    ClaudeCli,
    Gemini,
}

/// Configuration for persona inference and consensus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentsConfig {
    #[serde(default)]
    pub provider: ModelProvider,
    /// Model name passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-call timeout for the generative-text capability.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,
    /// Window of candles summarized for each analysis.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
    /// Upper bound on candles read per analysis.
    #[serde(default = "default_max_candles")]
    pub max_candles: usize,
    /// Analyses allowed in flight at once during an inference run.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Number of recent active predictions a consensus considers.
    #[serde(default = "default_consensus_limit")]
    pub consensus_limit: usize,
    /// Horizons each persona is asked about on every run.
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<Timeframe>,
    #[serde(default = "default_personas")]
    pub personas: Vec<PersonaConfig>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            model: default_model(),
            timeout_seconds: default_model_timeout(),
            lookback_hours: default_lookback_hours(),
            max_candles: default_max_candles(),
            max_concurrent: default_max_concurrent(),
            consensus_limit: default_consensus_limit(),
            timeframes: default_timeframes(),
            personas: default_personas(),
        }
    }
}

impl AgentsConfig {
    pub fn enabled_personas(&self) -> impl Iterator<Item = &PersonaConfig> {
        self.personas.iter().filter(|p| p.enabled)
    }
}

fn default_primary_exchange() -> String {
    "binance".to_string()
}

fn default_hot_capacity() -> u64 {
    1_000
}

fn default_hot_ttl() -> u64 {
    30
}

fn default_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_model_timeout() -> u64 {
    45
}

fn default_lookback_hours() -> u32 {
    24
}

fn default_max_candles() -> usize {
    100
}

fn default_max_concurrent() -> usize {
    4
}

fn default_consensus_limit() -> usize {
    10
}

fn default_timeframes() -> Vec<Timeframe> {
    vec![Timeframe::Day]
}
