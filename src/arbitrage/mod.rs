//! Arbitrage module for pricing and detecting opportunities.
//!
//! This module handles:
//! - Implied probability validation and stake sizing
//! - Best sportsbook price selection per team
//! - Opportunity detection for a matched game

pub mod calculator;
pub mod detector;
pub mod pricing;

pub use calculator::{
    calculate_stakes, theoretical_profit_percent, Probability, StakePlan, MONEY_DP, PROBABILITY_DP,
};
pub use detector::{detect, ArbitrageOpportunity, EventDates, StakeSizing};
pub use pricing::{select_best_prices, BestPrice};
