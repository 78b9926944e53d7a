//! NBA moneyline arbitrage scanner.
//!
//! Compares Polymarket NBA game markets against the best available sportsbook
//! moneyline prices and reports pairings whose implied probabilities sum to
//! less than one.
//!
//! # Strategy
//!
//! Back team X on Polymarket and its opponent Y at the sportsbook offering
//! the best price for Y. Exactly one of them wins, so if the two implied
//! probabilities sum below one the stakes can be sized for a profit either
//! way:
//!
//! ```text
//! Polymarket Heat:     0.550
//! FanDuel Bulls @2.63: 0.380
//! ──────────────────────────
//! Total:               0.930 < 1
//! Profit:              7.00% theoretical
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`teams`]: Team name normalization and title parsing
//! - [`matching`]: Cross-source event matching
//! - [`market`]: Polymarket event discovery and types
//! - [`odds`]: Sportsbook odds client, cache and exchange rate
//! - [`arbitrage`]: Best-price selection, detection and stake sizing
//! - [`report`]: Report rendering and writing
//! - [`snapshot`]: Persisted snapshots of both sources
//! - [`pipeline`]: A full scan run
//! - [`api`]: HTTP odds server
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod market;
pub mod matching;
pub mod metrics;
pub mod odds;
pub mod pipeline;
pub mod report;
pub mod snapshot;
pub mod teams;
pub mod utils;

pub use config::Config;
pub use error::{Result, ScanError};
