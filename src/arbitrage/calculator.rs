//! Probability validation and arbitrage stake sizing.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ArbitrageError;

/// Decimal places kept on probabilities.
pub const PROBABILITY_DP: u32 = 3;
/// Decimal places kept on money.
pub const MONEY_DP: u32 = 2;

/// A win probability in `(0, 1]`.
///
/// Every division in the sizing formula goes through this type, so zero or
/// negative inputs are rejected at construction instead of faulting later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Probability(Decimal);

impl Probability {
    /// Validate a raw probability.
    pub fn new(value: Decimal) -> Result<Self, ArbitrageError> {
        if value <= Decimal::ZERO || value > Decimal::ONE {
            return Err(ArbitrageError::InvalidProbability(value));
        }
        Ok(Self(value))
    }

    /// Implied probability of decimal odds, rounded to 3 places.
    pub fn from_decimal_odds(odds: Decimal) -> Result<Self, ArbitrageError> {
        if odds <= Decimal::ZERO {
            return Err(ArbitrageError::InvalidProbability(odds));
        }
        Self::new((Decimal::ONE / odds).round_dp(PROBABILITY_DP))
    }

    /// Raw value.
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Payout multiple per unit staked: `1 / p`.
    pub fn decimal_odds(self) -> Decimal {
        Decimal::ONE / self.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// How to split stakes across the two legs of an arbitrage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StakePlan {
    /// Stake on the sportsbook leg, base currency.
    pub primary_stake: Decimal,
    /// Stake on the prediction market leg, base currency.
    pub secondary_stake_same_currency: Decimal,
    /// Stake on the prediction market leg, quote currency.
    pub secondary_stake_converted: Decimal,
    /// Profit whichever leg wins, base currency.
    pub guaranteed_profit: Decimal,
}

/// Size both legs of an arbitrage.
///
/// The secondary stake equalizes the payout of the two legs, so the profit is
/// the same whichever side wins. Returns `None` when the probabilities sum to
/// one or more.
pub fn calculate_stakes(
    primary: Probability,
    secondary: Probability,
    initial_stake: Decimal,
    conversion_rate: Decimal,
) -> Option<StakePlan> {
    if primary.value() + secondary.value() >= Decimal::ONE {
        return None;
    }

    let primary_payout = initial_stake.checked_mul(primary.decimal_odds())?;
    let secondary_same = primary_payout.checked_div(secondary.decimal_odds())?;
    let secondary_converted = secondary_same.checked_mul(conversion_rate)?;
    let profit = primary_payout - initial_stake - secondary_same;

    Some(StakePlan {
        primary_stake: initial_stake.round_dp(MONEY_DP),
        secondary_stake_same_currency: secondary_same.round_dp(MONEY_DP),
        secondary_stake_converted: secondary_converted.round_dp(MONEY_DP),
        guaranteed_profit: profit.round_dp(MONEY_DP),
    })
}

/// Theoretical profit percentage of a combined probability.
pub fn theoretical_profit_percent(total_probability: Decimal) -> Decimal {
    ((Decimal::ONE - total_probability) * Decimal::ONE_HUNDRED).round_dp(MONEY_DP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn p(value: Decimal) -> Probability {
        Probability::new(value).unwrap()
    }

    #[test]
    fn probability_rejects_out_of_range() {
        assert_eq!(
            Probability::new(Decimal::ZERO),
            Err(ArbitrageError::InvalidProbability(Decimal::ZERO))
        );
        assert!(Probability::new(dec!(-0.2)).is_err());
        assert!(Probability::new(dec!(1.01)).is_err());
        assert!(Probability::new(Decimal::ONE).is_ok());
    }

    #[test]
    fn implied_probability_from_odds() {
        assert_eq!(Probability::from_decimal_odds(dec!(2.10)).unwrap().value(), dec!(0.476));
        assert_eq!(Probability::from_decimal_odds(dec!(1.91)).unwrap().value(), dec!(0.524));
        assert!(Probability::from_decimal_odds(Decimal::ZERO).is_err());
        assert!(Probability::from_decimal_odds(dec!(-1.5)).is_err());
        // Rounds to zero.
        assert!(Probability::from_decimal_odds(dec!(5000)).is_err());
    }

    #[test]
    fn no_plan_without_arbitrage() {
        assert!(calculate_stakes(p(dec!(0.5)), p(dec!(0.5)), dec!(100), dec!(0.73)).is_none());
        assert!(calculate_stakes(p(dec!(0.62)), p(dec!(0.40)), dec!(100), dec!(0.73)).is_none());
        assert!(calculate_stakes(p(dec!(1)), p(dec!(0.01)), dec!(100), dec!(0.73)).is_none());
    }

    #[test]
    fn stake_plan_for_known_inputs() {
        // primary 0.38, secondary 0.55: payout 100/0.38 = 263.157...
        // secondary stake = 263.157... * 0.55 = 144.736...
        let plan = calculate_stakes(p(dec!(0.38)), p(dec!(0.55)), dec!(100), dec!(0.73)).unwrap();
        assert_eq!(plan.primary_stake, dec!(100));
        assert_eq!(plan.secondary_stake_same_currency, dec!(144.74));
        assert_eq!(plan.secondary_stake_converted, dec!(105.66));
        assert_eq!(plan.guaranteed_profit, dec!(18.42));
    }

    #[test]
    fn profit_is_identical_whichever_leg_wins() {
        let cases = [
            (dec!(0.38), dec!(0.55)),
            (dec!(0.476), dec!(0.5)),
            (dec!(0.1), dec!(0.85)),
            (dec!(0.9), dec!(0.05)),
            (dec!(0.333), dec!(0.333)),
        ];

        for (primary, secondary) in cases {
            let stake = dec!(100);
            let plan = calculate_stakes(p(primary), p(secondary), stake, dec!(0.73)).unwrap();
            // A cent of rounding on the secondary stake is scaled by its odds.
            let tolerance = dec!(0.01) + dec!(0.005) / secondary;
            let outlay = plan.primary_stake + plan.secondary_stake_same_currency;

            let if_primary_wins = plan.primary_stake / primary - outlay;
            let if_secondary_wins = plan.secondary_stake_same_currency / secondary - outlay;

            assert!(
                (if_primary_wins - if_secondary_wins).abs() <= tolerance,
                "{primary}/{secondary}: {if_primary_wins} vs {if_secondary_wins}"
            );
            assert!((plan.guaranteed_profit - if_primary_wins).abs() <= dec!(0.02));
            assert!(plan.guaranteed_profit > Decimal::ZERO);
        }
    }

    #[test]
    fn conversion_scales_secondary_stake() {
        let plan = calculate_stakes(p(dec!(0.4)), p(dec!(0.5)), dec!(100), Decimal::ONE).unwrap();
        assert_eq!(plan.secondary_stake_converted, plan.secondary_stake_same_currency);
    }

    #[test]
    fn profit_percent() {
        assert_eq!(theoretical_profit_percent(dec!(0.93)), dec!(7.00));
        assert_eq!(theoretical_profit_percent(dec!(0.9876)), dec!(1.24));
    }
}
