//! Time-boxed memoization of upstream odds, one entry per sport.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::OddsError;
use crate::metrics;

use super::client::OddsApiClient;
use super::types::OddsBoard;

/// Source of "now".
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Anything that can produce a fresh odds board for a sport.
pub trait OddsSource: Send + Sync {
    /// Fetch odds for `sport` from upstream.
    fn fetch(&self, sport: &str) -> impl Future<Output = Result<OddsBoard, OddsError>> + Send;
}

impl OddsSource for OddsApiClient {
    fn fetch(&self, sport: &str) -> impl Future<Output = Result<OddsBoard, OddsError>> + Send {
        self.fetch_odds(sport)
    }
}

/// Per-sport odds cache.
///
/// An entry is served while `now - fetched_at < ttl`. A failed fetch is
/// returned to the caller and leaves any previous entry untouched.
#[derive(Debug)]
pub struct OddsCache<S, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    entries: HashMap<String, (OddsBoard, DateTime<Utc>)>,
}

impl<S: OddsSource> OddsCache<S> {
    /// Create a cache on the wall clock.
    pub fn new(source: S, ttl: Duration) -> Self {
        Self::with_clock(source, SystemClock, ttl)
    }
}

impl<S: OddsSource, C: Clock> OddsCache<S, C> {
    /// Create a cache on a custom clock.
    pub fn with_clock(source: S, clock: C, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Return cached odds for `sport` if fresh, otherwise fetch and store.
    pub async fn get(&mut self, sport: &str) -> Result<OddsBoard, OddsError> {
        let now = self.clock.now();

        if let Some((board, fetched_at)) = self.entries.get(sport) {
            if now - *fetched_at < self.ttl {
                debug!(sport, "Returning cached odds");
                metrics::inc_cache_hits();
                return Ok(board.clone());
            }
        }

        info!(sport, "Fetching fresh odds");
        metrics::inc_cache_misses();
        let board = self.source.fetch(sport).await?;
        self.entries
            .insert(sport.to_string(), (board.clone(), now));
        Ok(board)
    }
}
