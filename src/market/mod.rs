//! Prediction market (Polymarket) events.
//!
//! This module handles:
//! - Event and market types as stored in the snapshot
//! - Paging through the Gamma events API
//! - Filtering upcoming NBA events

pub mod discovery;
pub mod types;

pub use discovery::{filter_nba_events, GammaClient, GammaEvent};
pub use types::{ListField, PredictionEvent, PredictionMarket};
