//! Event identity matching across the prediction market and sportsbooks.
//!
//! This module handles:
//! - Timestamp parsing and reference-zone normalization
//! - Pairing events by team set and start-time proximity

pub mod matcher;
pub mod time;

pub use matcher::{find_matches, prepare_games, GamePair, MatchWindow, PreparedGame, ScheduledGame};
pub use time::{in_reference_zone, parse_in_reference_zone, parse_timestamp, REFERENCE_ZONE};
