//! Best available sportsbook price per team.

use std::collections::BTreeMap;

use tracing::debug;

use super::calculator::Probability;
use crate::odds::BookmakerQuote;
use crate::teams::normalize;

/// Lowest implied probability quoted for a team, and who quoted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestPrice {
    /// Implied probability, rounded to 3 places.
    pub implied_probability: Probability,
    /// Bookmaker offering it.
    pub bookmaker: String,
}

/// Reduce every bookmaker's quote to the best price per canonical team.
///
/// Lower implied probability means a higher payout, so the minimum wins; on a
/// tie the bookmaker listed first keeps it. Quotes that do not yield a valid
/// probability are ignored, and a team with no valid quote is absent from the
/// result.
pub fn select_best_prices(quotes: &[BookmakerQuote]) -> BTreeMap<String, BestPrice> {
    let mut best: BTreeMap<String, BestPrice> = BTreeMap::new();

    for quote in quotes {
        for (team, odds) in &quote.odds {
            let implied = match Probability::from_decimal_odds(*odds) {
                Ok(p) => p,
                Err(e) => {
                    debug!(bookmaker = %quote.name, team = %team, error = %e, "Ignoring quote");
                    continue;
                }
            };

            let team = normalize(team);
            let improves = best
                .get(&team)
                .map_or(true, |current| implied < current.implied_probability);

            if improves {
                best.insert(
                    team,
                    BestPrice {
                        implied_probability: implied,
                        bookmaker: quote.name.clone(),
                    },
                );
            }
        }
    }

    best
}
