pub mod error;
pub mod memory;
pub mod predictions;
pub mod prices;
pub mod reader;
pub mod retention;
pub mod sqlite;

pub use error::StoreError;
pub use reader::StoreReader;
pub use retention::{retention_cutoff, SweepReport};
pub use sqlite::Store;
