//! Sportsbook odds: upstream client, cache and currency conversion.
//!
//! This module handles:
//! - Fetching moneyline odds from The Odds API
//! - Per-sport caching with a freshness window
//! - Resolving the base → quote conversion rate for stake sizing

pub mod cache;
pub mod client;
pub mod exchange;
pub mod types;

pub use cache::{Clock, OddsCache, OddsSource, SystemClock};
pub use client::{build_board, OddsApiClient};
pub use exchange::{resolve_conversion_rate, ExchangeRateClient};
pub use types::{BookmakerQuote, OddsBoard, SportsbookGame, SportsbookSnapshot};
