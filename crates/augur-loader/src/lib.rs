//! Market data ingestion and scheduled inference daemon.
//!
//! Three jobs share one SQLite store: candle ingestion on a fixed interval,
//! persona inference on an hourly calendar, and a daily retention sweep.

pub mod config;
pub mod daemon;
pub mod error;
pub mod exchange;
pub mod fetcher;
pub mod rate_limit;
pub mod schedule;
