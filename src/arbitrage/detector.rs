//! Arbitrage detection between a prediction market and the best sportsbook
//! prices for the same game.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::calculator::{
    calculate_stakes, theoretical_profit_percent, Probability, StakePlan, PROBABILITY_DP,
};
use super::pricing::BestPrice;
use crate::error::ArbitrageError;
use crate::metrics::{self, SkipReason};
use crate::teams::TeamSet;

/// Stake sizing inputs shared by every opportunity in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeSizing {
    /// Sportsbook stake, base currency.
    pub initial_stake: Decimal,
    /// Base → quote currency rate.
    pub conversion_rate: Decimal,
}

/// Raw event dates carried into the report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDates {
    /// Prediction market end date as delivered.
    pub prediction: String,
    /// Sportsbook commence time as delivered.
    pub sportsbook: String,
}

/// A detected arbitrage: back one team on the prediction market and its
/// opponent at a sportsbook.
///
/// Only built by [`detect`], which guarantees
/// `total_probability < 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ArbitrageOpportunity {
    /// Team backed on the prediction market.
    pub prediction_team: String,
    /// Prediction market probability.
    pub prediction_probability: Probability,
    /// Prediction market decimal odds.
    pub prediction_decimal_odds: Decimal,
    /// Team backed at the sportsbook.
    pub sportsbook_team: String,
    /// Best sportsbook implied probability.
    pub sportsbook_probability: Probability,
    /// Best sportsbook decimal odds.
    pub sportsbook_decimal_odds: Decimal,
    /// Bookmaker quoting the best price.
    pub bookmaker: String,
    /// Sum of both probabilities, 3 places.
    pub total_probability: Decimal,
    /// `(1 - total_probability) * 100`, 2 places.
    pub theoretical_profit_percent: Decimal,
    /// Stake split.
    pub stakes: StakePlan,
    /// Prediction market event date.
    pub prediction_date: String,
    /// Sportsbook event date.
    pub sportsbook_date: String,
}

/// Evaluate every prediction-market outcome of one game against the best
/// sportsbook price for the opposing team.
///
/// Outcomes are evaluated in listed order. Pairings with an invalid
/// probability, an unresolvable opponent or no opposing price are skipped.
#[instrument(skip_all, fields(teams = %teams))]
pub fn detect(
    prediction_odds: &[(String, Decimal)],
    best_prices: &BTreeMap<String, BestPrice>,
    teams: &TeamSet,
    sizing: StakeSizing,
    dates: &EventDates,
) -> Vec<ArbitrageOpportunity> {
    prediction_odds
        .iter()
        .filter_map(|(team, price)| {
            match evaluate(team, *price, best_prices, teams, sizing, dates) {
                Ok(found) => found,
                Err(e) => {
                    debug!(team = %team, error = %e, "Skipping pairing");
                    metrics::inc_events_skipped(skip_reason(&e));
                    None
                }
            }
        })
        .collect()
}

fn skip_reason(error: &ArbitrageError) -> SkipReason {
    match error {
        ArbitrageError::InvalidProbability(_) => SkipReason::InvalidProbability,
        ArbitrageError::AmbiguousOpponent { .. } => SkipReason::AmbiguousOpponent,
    }
}

fn evaluate(
    team: &str,
    price: Decimal,
    best_prices: &BTreeMap<String, BestPrice>,
    teams: &TeamSet,
    sizing: StakeSizing,
    dates: &EventDates,
) -> Result<Option<ArbitrageOpportunity>, ArbitrageError> {
    let opponent = teams.opponent_of(team)?;

    let Some(best) = best_prices.get(opponent) else {
        debug!(team, opponent, "No sportsbook price for opponent");
        metrics::inc_events_skipped(SkipReason::NoOpposingPrice);
        return Ok(None);
    };

    let prediction = Probability::new(price)?;
    let sportsbook = best.implied_probability;
    let total_probability = prediction.value() + sportsbook.value();

    if total_probability >= Decimal::ONE {
        debug!(
            team,
            opponent,
            total = %total_probability,
            "No arbitrage"
        );
        return Ok(None);
    }

    let total_probability = total_probability.round_dp(PROBABILITY_DP);
    let Some(stakes) =
        calculate_stakes(sportsbook, prediction, sizing.initial_stake, sizing.conversion_rate)
    else {
        return Ok(None);
    };

    let opportunity = ArbitrageOpportunity {
        prediction_team: team.to_string(),
        prediction_probability: prediction,
        prediction_decimal_odds: prediction.decimal_odds(),
        sportsbook_team: opponent.to_string(),
        sportsbook_probability: sportsbook,
        sportsbook_decimal_odds: sportsbook.decimal_odds(),
        bookmaker: best.bookmaker.clone(),
        total_probability,
        theoretical_profit_percent: theoretical_profit_percent(total_probability),
        stakes,
        prediction_date: dates.prediction.clone(),
        sportsbook_date: dates.sportsbook.clone(),
    };

    info!(
        prediction_team = %opportunity.prediction_team,
        sportsbook_team = %opportunity.sportsbook_team,
        bookmaker = %opportunity.bookmaker,
        total = %opportunity.total_probability,
        profit_pct = %opportunity.theoretical_profit_percent,
        "Arbitrage opportunity detected"
    );
    metrics::inc_opportunities_detected();

    Ok(Some(opportunity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn best(entries: &[(&str, Decimal, &str)]) -> BTreeMap<String, BestPrice> {
        entries
            .iter()
            .map(|(team, p, book)| {
                (
                    team.to_string(),
                    BestPrice {
                        implied_probability: Probability::new(*p).unwrap(),
                        bookmaker: book.to_string(),
                    },
                )
            })
            .collect()
    }

    fn sizing() -> StakeSizing {
        StakeSizing {
            initial_stake: dec!(100),
            conversion_rate: dec!(0.73),
        }
    }

    fn teams() -> TeamSet {
        TeamSet::new(["Heat", "Bulls"]).unwrap()
    }

    #[test]
    fn reports_only_the_profitable_pairing() {
        let prediction = vec![
            ("Heat".to_string(), dec!(0.55)),
            ("Bulls".to_string(), dec!(0.40)),
        ];
        let prices = best(&[("Bulls", dec!(0.38), "FanDuel"), ("Heat", dec!(0.62), "DraftKings")]);

        let found = detect(&prediction, &prices, &teams(), sizing(), &EventDates::default());

        assert_eq!(found.len(), 1);
        let opp = &found[0];
        assert_eq!(opp.prediction_team, "Heat");
        assert_eq!(opp.sportsbook_team, "Bulls");
        assert_eq!(opp.bookmaker, "FanDuel");
        assert_eq!(opp.total_probability, dec!(0.93));
        assert_eq!(opp.theoretical_profit_percent, dec!(7.00));
        assert_eq!(opp.stakes.guaranteed_profit, dec!(18.42));
    }

    #[test]
    fn total_probability_is_rounded_to_three_places() {
        let prediction = vec![("Heat".to_string(), dec!(0.5555))];
        let prices = best(&[("Bulls", dec!(0.38), "FanDuel")]);

        let found = detect(&prediction, &prices, &teams(), sizing(), &EventDates::default());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].total_probability, dec!(0.936));
        assert_eq!(found[0].theoretical_profit_percent, dec!(6.40));
    }

    #[test]
    fn equality_is_not_an_opportunity() {
        let prediction = vec![("Heat".to_string(), dec!(0.6))];
        let prices = best(&[("Bulls", dec!(0.4), "FanDuel")]);
        assert!(detect(&prediction, &prices, &teams(), sizing(), &EventDates::default()).is_empty());
    }

    #[test]
    fn zero_probability_is_skipped() {
        let prediction = vec![("Heat".to_string(), Decimal::ZERO)];
        let prices = best(&[("Bulls", dec!(0.4), "FanDuel")]);
        assert!(detect(&prediction, &prices, &teams(), sizing(), &EventDates::default()).is_empty());
    }

    #[test]
    fn unknown_team_is_skipped() {
        let prediction = vec![("Knicks".to_string(), dec!(0.3))];
        let prices = best(&[("Bulls", dec!(0.4), "FanDuel"), ("Heat", dec!(0.4), "FanDuel")]);
        assert!(detect(&prediction, &prices, &teams(), sizing(), &EventDates::default()).is_empty());
    }

    #[test]
    fn missing_opposing_price_is_skipped() {
        let prediction = vec![("Heat".to_string(), dec!(0.3))];
        let prices = best(&[("Heat", dec!(0.4), "FanDuel")]);
        assert!(detect(&prediction, &prices, &teams(), sizing(), &EventDates::default()).is_empty());
    }

    #[test]
    fn full_names_resolve_to_canonical_opponent() {
        let prediction = vec![("Miami Heat".to_string(), dec!(0.45))];
        let prices = best(&[("Bulls", dec!(0.5), "BetMGM")]);
        let dates = EventDates {
            prediction: "2024-11-14 19:30:00-0500".to_string(),
            sportsbook: "2024-11-15 00:30:00".to_string(),
        };

        let found = detect(&prediction, &prices, &teams(), sizing(), &dates);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sportsbook_team, "Bulls");
        assert_eq!(found[0].prediction_date, dates.prediction);
        assert_eq!(found[0].sportsbook_date, dates.sportsbook);
    }
}
