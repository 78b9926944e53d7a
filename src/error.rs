//! Unified error types for the arbitrage scanner.

use std::path::PathBuf;

use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type for a scan run.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Snapshot loading error (aborts the run).
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Upstream odds error.
    #[error("odds error: {0}")]
    Odds(#[from] OddsError),

    /// Prediction market discovery error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Report writing error.
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking scan task panicked or was cancelled.
    #[error("scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors loading a persisted snapshot. Both snapshots are required, so
/// these abort the run.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot file does not exist.
    #[error("snapshot not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The snapshot file could not be read.
    #[error("failed to read snapshot {}: {source}", path.display())]
    Unreadable {
        /// Path of the snapshot.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The snapshot file is not valid JSON of the expected shape.
    #[error("corrupt snapshot {}: {source}", path.display())]
    Corrupt {
        /// Path of the snapshot.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// A single malformed event. Logged and skipped, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Timestamp could not be parsed in any accepted format.
    #[error("unparseable timestamp {0:?}")]
    InvalidTimestamp(String),

    /// Event carries no timestamp at all.
    #[error("missing timestamp")]
    MissingTimestamp,

    /// A serialized list field is not a JSON array of strings.
    #[error("malformed {field} list: {reason}")]
    MalformedList {
        /// Field name.
        field: &'static str,
        /// Parser message.
        reason: String,
    },

    /// Outcome and price lists differ in length.
    #[error("{outcomes} outcomes but {prices} prices")]
    LengthMismatch {
        /// Number of outcomes.
        outcomes: usize,
        /// Number of prices.
        prices: usize,
    },

    /// A price string is not a decimal number.
    #[error("unparseable price {0:?}")]
    InvalidPrice(String),

    /// Event has no markets.
    #[error("event has no markets")]
    NoMarkets,

    /// Team set does not contain exactly two teams.
    #[error("expected 2 teams, found {0:?}")]
    TeamCount(Vec<String>),
}

/// Arbitrage detection and sizing errors. Each one skips a single pairing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbitrageError {
    /// Probability outside `(0, 1]`.
    #[error("invalid probability {0}")]
    InvalidProbability(Decimal),

    /// Opposing team could not be resolved to exactly one team.
    #[error("cannot resolve opponent of {team}: {candidates:?}")]
    AmbiguousOpponent {
        /// Team whose opponent was looked up.
        team: String,
        /// Teams left after removing it from the set.
        candidates: Vec<String>,
    },
}

/// Upstream odds provider errors.
#[derive(Error, Debug)]
pub enum OddsError {
    /// API key rejected.
    #[error("invalid API key")]
    Unauthorized,

    /// Request quota exhausted.
    #[error("API request limit exceeded")]
    RateLimited,

    /// Any other non-success status.
    #[error("odds API returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// API key missing from configuration.
    #[error("ODDS_API_KEY is not set")]
    MissingApiKey,

    /// Invalid base URL.
    #[error("invalid odds API url: {0}")]
    Url(#[from] url::ParseError),

    /// Transport failure, including timeouts.
    #[error("odds request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body is not in the expected shape.
    #[error("failed to parse odds response: {0}")]
    Parse(String),
}

/// Exchange-rate lookup errors. Never escape the rate resolver.
#[derive(Error, Debug)]
pub enum ExchangeRateError {
    /// Transport failure, including timeouts.
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status.
    #[error("rate service returned HTTP {0}")]
    Status(u16),

    /// Quote currency absent from the response.
    #[error("rate for {0} missing from response")]
    MissingRate(String),

    /// Rate is zero or negative.
    #[error("non-positive rate {0}")]
    NonPositive(Decimal),
}

/// Prediction market (Gamma API) errors.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Failed to fetch a page of events.
    #[error("failed to fetch events at offset {offset}: {reason}")]
    FetchFailed {
        /// Page offset.
        offset: usize,
        /// Reason for failure.
        reason: String,
    },

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Report writing errors.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Report directory could not be created or listed.
    #[error("report directory {}: {source}", path.display())]
    Directory {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Report file could not be written, renamed or removed.
    #[error("report file {}: {source}", path.display())]
    File {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ScanError>;
