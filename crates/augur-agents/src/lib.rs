pub mod analyzer;
pub mod claude_cli;
pub mod consensus;
pub mod error;
pub mod gemini;
pub mod inference;
pub mod model;
pub mod parser;
pub mod prompts;
pub mod summary;

pub mod test_support;

pub use analyzer::{AnalyzerSettings, PersonaAnalyzer};
pub use consensus::{compute_consensus, ConsensusAggregator, TIE_BREAK_PRIORITY};
pub use error::AgentError;
pub use inference::{InferenceRunner, RunReport};
pub use model::{build_model, GenerativeModel};
pub use summary::MarketSummary;
