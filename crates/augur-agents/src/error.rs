use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Model API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model response parse error: {0}")]
    Parse(String),

    #[error("Model response failed validation: {0}")]
    Validation(String),

    #[error("Model call timed out after {0} seconds")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] augur_store::StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
