use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("Store not available: {0}")]
    Unavailable(String),
}
