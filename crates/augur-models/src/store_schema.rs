/// SQLite schema shared by the loader (writer) and the query CLI (reader).
///
/// Timestamps are stored as UTC epoch milliseconds so range filters and
/// ordering are plain integer comparisons.
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS candles (
///     id            INTEGER PRIMARY KEY AUTOINCREMENT,
///     symbol        TEXT NOT NULL,
///     exchange      TEXT NOT NULL,
///     ts_ms         INTEGER NOT NULL,
///     open          REAL NOT NULL CHECK (open > 0),
///     high          REAL NOT NULL CHECK (high > 0),
///     low           REAL NOT NULL CHECK (low > 0),
///     close         REAL NOT NULL CHECK (close > 0),
///     volume        REAL NOT NULL CHECK (volume >= 0),
///     created_at_ms INTEGER NOT NULL,
///     UNIQUE (symbol, exchange, ts_ms)
/// );
///
/// CREATE TABLE IF NOT EXISTS predictions (
///     id            INTEGER PRIMARY KEY AUTOINCREMENT,
///     run_id        TEXT NOT NULL,
///     persona       TEXT NOT NULL,
///     symbol        TEXT NOT NULL,
///     direction     TEXT NOT NULL,
///     confidence    REAL NOT NULL,
///     timeframe     TEXT NOT NULL,
///     reasoning     TEXT NOT NULL,
///     created_at_ms INTEGER NOT NULL,
///     is_active     INTEGER NOT NULL DEFAULT 1
/// );
/// ```
pub const STORE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS candles (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol        TEXT NOT NULL,
    exchange      TEXT NOT NULL,
    ts_ms         INTEGER NOT NULL,
    open          REAL NOT NULL CHECK (open > 0),
    high          REAL NOT NULL CHECK (high > 0),
    low           REAL NOT NULL CHECK (low > 0),
    close         REAL NOT NULL CHECK (close > 0),
    volume        REAL NOT NULL CHECK (volume >= 0),
    created_at_ms INTEGER NOT NULL,
    UNIQUE (symbol, exchange, ts_ms)
);
CREATE INDEX IF NOT EXISTS idx_candles_ts ON candles(ts_ms);

CREATE TABLE IF NOT EXISTS predictions (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id        TEXT NOT NULL,
    persona       TEXT NOT NULL,
    symbol        TEXT NOT NULL,
    direction     TEXT NOT NULL CHECK (direction IN ('bullish', 'bearish', 'neutral')),
    confidence    REAL NOT NULL CHECK (confidence >= 0 AND confidence <= 100),
    timeframe     TEXT NOT NULL,
    reasoning     TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_predictions_persona ON predictions(symbol, persona, created_at_ms);
CREATE INDEX IF NOT EXISTS idx_predictions_active ON predictions(symbol, timeframe, is_active);
CREATE INDEX IF NOT EXISTS idx_predictions_created ON predictions(created_at_ms);
";
