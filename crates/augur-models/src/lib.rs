pub mod candle;
pub mod config;
pub mod consensus;
pub mod persona;
pub mod prediction;
pub mod store_schema;

pub use candle::{normalize_symbol, pair_symbol, Candle, CandleRow, Ticker};
pub use config::{AgentsConfig, AugurConfig, ModelProvider, StoreConfig};
pub use consensus::ConsensusResult;
pub use persona::{default_personas, PersonaConfig};
pub use prediction::{Analysis, Direction, Prediction, PredictionQuery, Timeframe};
