use thiserror::Error;

use crate::exchange::FetchError;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Store error: {0}")]
    Store(#[from] augur_store::StoreError),

    #[error("Agent error: {0}")]
    Agent(#[from] augur_agents::AgentError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Job failed: {0}")]
    Job(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
