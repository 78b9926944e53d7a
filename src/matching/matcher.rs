//! Cross-source event pairing.
//!
//! Two events describe the same game when, in the reference zone, both are
//! still ahead of the evaluation instant, fall on the same calendar date,
//! start within the match window of each other and involve the same two
//! canonical teams.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use super::time::{in_reference_zone, parse_in_reference_zone};
use crate::error::EventError;
use crate::metrics::{self, SkipReason};
use crate::teams::TeamSet;

/// An event from either source that can take part in matching.
pub trait ScheduledGame {
    /// Human-readable label used in logs.
    fn label(&self) -> &str;

    /// Raw start (or end) timestamp as delivered by the source.
    fn start_time(&self) -> Option<&str>;

    /// The two canonical teams playing.
    fn team_set(&self) -> Result<TeamSet, EventError>;
}

/// An event whose timestamp and teams parsed cleanly.
#[derive(Debug, Clone)]
pub struct PreparedGame<'a, G> {
    /// Source event.
    pub game: &'a G,
    /// Canonical teams.
    pub teams: TeamSet,
    /// Start time in the reference zone.
    pub starts_at: DateTime<Tz>,
}

/// A prediction-market event and the sportsbook event for the same game.
#[derive(Debug, Clone)]
pub struct GamePair<'a, A, B> {
    /// Prediction market side.
    pub prediction: &'a A,
    /// Sportsbook side.
    pub sportsbook: &'a B,
    /// Teams shared by both sides.
    pub teams: TeamSet,
    /// Prediction market time in the reference zone.
    pub prediction_time: DateTime<Tz>,
    /// Sportsbook time in the reference zone.
    pub sportsbook_time: DateTime<Tz>,
}

/// Matching parameters.
#[derive(Debug, Clone, Copy)]
pub struct MatchWindow {
    /// Evaluation instant; earlier events are excluded.
    pub now: DateTime<Utc>,
    /// Maximum start-time distance between the two sides.
    pub tolerance: Duration,
}

impl MatchWindow {
    /// Window with the given tolerance in seconds.
    pub fn new(now: DateTime<Utc>, tolerance_secs: i64) -> Self {
        Self {
            now,
            tolerance: Duration::try_seconds(tolerance_secs.max(0)).unwrap_or(Duration::MAX),
        }
    }
}

/// Parse times and teams, dropping malformed and already-started events.
pub fn prepare_games<'a, G: ScheduledGame>(
    games: &'a [G],
    now: DateTime<Utc>,
    source: &str,
) -> Vec<PreparedGame<'a, G>> {
    let now = in_reference_zone(now);

    games
        .iter()
        .filter_map(|game| {
            let raw = match game.start_time() {
                Some(raw) => raw,
                None => {
                    warn!(source, event = game.label(), "Skipping event without timestamp");
                    metrics::inc_events_skipped(SkipReason::MissingTimestamp);
                    return None;
                }
            };

            let starts_at = match parse_in_reference_zone(raw) {
                Ok(t) => t,
                Err(e) => {
                    warn!(source, event = game.label(), error = %e, "Skipping event");
                    metrics::inc_events_skipped(SkipReason::InvalidTimestamp);
                    return None;
                }
            };

            if starts_at < now {
                debug!(source, event = game.label(), %starts_at, "Skipping past event");
                metrics::inc_events_skipped(SkipReason::PastEvent);
                return None;
            }

            let teams = match game.team_set() {
                Ok(t) => t,
                Err(e) => {
                    warn!(source, event = game.label(), error = %e, "Skipping event");
                    metrics::inc_events_skipped(SkipReason::MalformedTeams);
                    return None;
                }
            };

            Some(PreparedGame {
                game,
                teams,
                starts_at,
            })
        })
        .collect()
}

/// Whether two prepared events describe the same game.
fn is_same_game<A, B>(a: &PreparedGame<'_, A>, b: &PreparedGame<'_, B>, tolerance: Duration) -> bool {
    a.starts_at.date_naive() == b.starts_at.date_naive()
        && distance(a.starts_at, b.starts_at) <= tolerance
        && a.teams == b.teams
}

fn distance(a: DateTime<Tz>, b: DateTime<Tz>) -> Duration {
    let delta = a - b;
    if delta < Duration::zero() {
        -delta
    } else {
        delta
    }
}

/// Pair sportsbook events with prediction-market events.
///
/// Each sportsbook event is paired with at most one prediction-market event:
/// the candidate closest in time, the earliest listed on ties. Output follows
/// sportsbook order.
pub fn find_matches<'a, A, B>(
    prediction: &'a [A],
    sportsbook: &'a [B],
    window: MatchWindow,
) -> Vec<GamePair<'a, A, B>>
where
    A: ScheduledGame,
    B: ScheduledGame,
{
    let side_a = prepare_games(prediction, window.now, "prediction");
    let side_b = prepare_games(sportsbook, window.now, "sportsbook");

    debug!(
        prediction = side_a.len(),
        sportsbook = side_b.len(),
        "Upcoming events eligible for matching"
    );

    let mut pairs = Vec::new();

    for b in &side_b {
        let candidates: Vec<&PreparedGame<'a, A>> = side_a
            .iter()
            .filter(|a| is_same_game(a, b, window.tolerance))
            .collect();

        if candidates.len() > 1 {
            info!(
                event = b.game.label(),
                teams = %b.teams,
                candidates = candidates.len(),
                "Several prediction events match; choosing closest start time"
            );
        }

        let Some(a) = candidates
            .into_iter()
            .min_by_key(|a| distance(a.starts_at, b.starts_at))
        else {
            debug!(event = b.game.label(), teams = %b.teams, "No matching prediction event");
            continue;
        };

        info!(
            prediction = a.game.label(),
            sportsbook = b.game.label(),
            teams = %b.teams,
            "Matched game"
        );
        metrics::inc_games_matched();

        pairs.push(GamePair {
            prediction: a.game,
            sportsbook: b.game,
            teams: b.teams.clone(),
            prediction_time: a.starts_at,
            sportsbook_time: b.starts_at,
        });
    }

    pairs
}
