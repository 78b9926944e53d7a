//! Prometheus metrics for a scan run and the odds server.
//!
//! This module provides metrics for:
//! - Skipped events by reason
//! - Matched games and detected opportunities
//! - Odds cache hits and misses
//! - Exchange-rate fallbacks
//! - Upstream odds fetch latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use strum::IntoStaticStr;
use tracing::debug;

// === Metric Name Constants ===

/// Skipped events counter metric name.
pub const METRIC_EVENTS_SKIPPED: &str = "events_skipped_total";
/// Matched games counter metric name.
pub const METRIC_GAMES_MATCHED: &str = "games_matched_total";
/// Opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "opportunities_detected_total";
/// Cache hit counter metric name.
pub const METRIC_ODDS_CACHE_HITS: &str = "odds_cache_hits_total";
/// Cache miss counter metric name.
pub const METRIC_ODDS_CACHE_MISSES: &str = "odds_cache_misses_total";
/// Exchange-rate fallback counter metric name.
pub const METRIC_EXCHANGE_RATE_FALLBACKS: &str = "exchange_rate_fallbacks_total";
/// Upstream odds fetch latency metric name.
pub const METRIC_ODDS_FETCH_LATENCY: &str = "odds_fetch_latency_ms";

/// Why an event or candidate pairing was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Snapshot entry is missing a required field or has the wrong shape.
    MalformedRecord,
    /// Event has no timestamp.
    MissingTimestamp,
    /// Timestamp did not parse.
    InvalidTimestamp,
    /// Event starts before the evaluation instant.
    PastEvent,
    /// Team set is not exactly two teams.
    MalformedTeams,
    /// Outcome/price lists are malformed.
    MalformedPrices,
    /// Probability outside `(0, 1]`.
    InvalidProbability,
    /// Opponent could not be resolved.
    AmbiguousOpponent,
    /// Sportsbook has no usable price for the opponent.
    NoOpposingPrice,
}

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(
        METRIC_EVENTS_SKIPPED,
        "Events or pairings dropped, labelled by reason"
    );
    describe_counter!(
        METRIC_GAMES_MATCHED,
        "Games paired across the two sources"
    );
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of arbitrage opportunities detected"
    );
    describe_counter!(
        METRIC_ODDS_CACHE_HITS,
        "Odds requests served from cache"
    );
    describe_counter!(
        METRIC_ODDS_CACHE_MISSES,
        "Odds requests that went upstream"
    );
    describe_counter!(
        METRIC_EXCHANGE_RATE_FALLBACKS,
        "Runs that used the fallback conversion rate"
    );
    describe_histogram!(
        METRIC_ODDS_FETCH_LATENCY,
        "Upstream odds fetch latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Increment skipped events counter.
pub fn inc_events_skipped(reason: SkipReason) {
    let reason: &'static str = reason.into();
    counter!(METRIC_EVENTS_SKIPPED, "reason" => reason).increment(1);
}

/// Increment matched games counter.
pub fn inc_games_matched() {
    counter!(METRIC_GAMES_MATCHED).increment(1);
}

/// Increment opportunities detected counter.
pub fn inc_opportunities_detected() {
    counter!(METRIC_OPPORTUNITIES_DETECTED).increment(1);
}

/// Increment cache hit counter.
pub fn inc_cache_hits() {
    counter!(METRIC_ODDS_CACHE_HITS).increment(1);
}

/// Increment cache miss counter.
pub fn inc_cache_misses() {
    counter!(METRIC_ODDS_CACHE_MISSES).increment(1);
}

/// Increment exchange-rate fallback counter.
pub fn inc_exchange_rate_fallbacks() {
    counter!(METRIC_EXCHANGE_RATE_FALLBACKS).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for upstream odds fetches.
pub fn timer_odds_fetch() -> LatencyTimer {
    LatencyTimer::new(METRIC_ODDS_FETCH_LATENCY)
}
