//! Prediction market (Polymarket) event types.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::matching::ScheduledGame;
use crate::teams::{extract_teams_from_title, TeamSet};

/// A list field that the Gamma API ships either as a JSON-encoded string
/// (`"[\"Lakers\", \"Celtics\"]"`) or as a plain array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    /// Array encoded inside a JSON string.
    Encoded(String),
    /// Array delivered as-is.
    Plain(Vec<String>),
}

impl Default for ListField {
    fn default() -> Self {
        ListField::Plain(Vec::new())
    }
}

impl ListField {
    /// Decode into a list of strings. Encoded strings must hold a strict JSON
    /// array of strings; nothing else is accepted.
    pub fn decode(&self, field: &'static str) -> Result<Vec<String>, EventError> {
        match self {
            ListField::Plain(items) => Ok(items.clone()),
            ListField::Encoded(raw) => {
                serde_json::from_str(raw).map_err(|e| EventError::MalformedList {
                    field,
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// One market inside a Polymarket event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMarket {
    /// Outcome labels (team names for moneyline markets).
    #[serde(default)]
    pub outcomes: ListField,
    /// Outcome prices, aligned with `outcomes`.
    #[serde(rename = "outcomePrices", default)]
    pub outcome_prices: ListField,
}

/// A Polymarket event as stored in the prediction-market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEvent {
    /// Event identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Matchup title, e.g. "Lakers vs. Celtics".
    #[serde(default)]
    pub title: String,
    /// Event ticker.
    #[serde(default)]
    pub ticker: Option<String>,
    /// Event description.
    #[serde(default)]
    pub description: Option<String>,
    /// End date with offset.
    #[serde(rename = "endDate", default)]
    pub end_date: Option<String>,
    /// Markets of this event; the first one is the moneyline.
    #[serde(default)]
    pub markets: Vec<PredictionMarket>,
}

impl PredictionEvent {
    /// Outcome → price pairs of the moneyline market, in listed order.
    pub fn outcome_prices(&self) -> Result<Vec<(String, Decimal)>, EventError> {
        let market = self.markets.first().ok_or(EventError::NoMarkets)?;
        let outcomes = market.outcomes.decode("outcomes")?;
        let prices = market.outcome_prices.decode("outcomePrices")?;

        if outcomes.len() != prices.len() {
            return Err(EventError::LengthMismatch {
                outcomes: outcomes.len(),
                prices: prices.len(),
            });
        }

        outcomes
            .into_iter()
            .zip(prices)
            .map(|(outcome, price)| {
                let value = Decimal::from_str(price.trim())
                    .map_err(|_| EventError::InvalidPrice(price.clone()))?;
                Ok((outcome, value))
            })
            .collect()
    }
}

impl ScheduledGame for PredictionEvent {
    fn label(&self) -> &str {
        &self.title
    }

    fn start_time(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    fn team_set(&self) -> Result<TeamSet, EventError> {
        extract_teams_from_title(&self.title)
    }
}
