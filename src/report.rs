//! Plain-text opportunity report.
//!
//! Each run replaces the previous report: the new file is written under a
//! temporary name, prior reports are purged, then the new one is renamed
//! into place.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::arbitrage::{ArbitrageOpportunity, MONEY_DP, PROBABILITY_DP};
use crate::error::ReportError;

/// Report file name prefix.
pub const REPORT_PREFIX: &str = "arbitrage_opportunities_";
/// Report file extension.
pub const REPORT_EXTENSION: &str = ".txt";
/// Marker written when a run finds nothing.
pub const NO_OPPORTUNITIES: &str = "No arbitrage opportunities found";

const HEADER: &str = "ARBITRAGE OPPORTUNITIES";
const TMP_NAME: &str = ".arbitrage_opportunities.tmp";

/// Currency labels for the bet lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyLabels {
    /// Sportsbook account currency.
    pub base: String,
    /// Prediction market account currency.
    pub quote: String,
}

impl Default for CurrencyLabels {
    fn default() -> Self {
        Self {
            base: "CAD".to_string(),
            quote: "USD".to_string(),
        }
    }
}

/// Render the report body. Opportunities appear in the order given.
pub fn render(opportunities: &[ArbitrageOpportunity], labels: &CurrencyLabels) -> String {
    let mut out = format!("{HEADER}\n\n");

    if opportunities.is_empty() {
        out.push_str(NO_OPPORTUNITIES);
        out.push('\n');
        return out;
    }

    let (base, quote) = (&labels.base, &labels.quote);
    for opp in opportunities {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "Polymarket Team: {} (odds: {}, prob: {})\n\
             Polymarket Event Date: {}\n\
             Bookmaker: {}\n\
             Primary Market Team: {} (odds: {}, prob: {})\n\
             Primary Market Event Date: {}\n\
             Total probability: {}\n\
             Theoretical profit: {}%\n\
             \n\
             Bet Details:\n\
             Primary Market Bet ({base}): ${}\n\
             Polymarket Bet ({base}): ${}\n\
             Polymarket Bet ({quote}): ${}\n\
             Guaranteed Profit ({base}): ${}\n",
            opp.prediction_team,
            fixed(opp.prediction_decimal_odds, MONEY_DP),
            fixed(opp.prediction_probability.value(), PROBABILITY_DP),
            opp.prediction_date,
            opp.bookmaker,
            opp.sportsbook_team,
            fixed(opp.sportsbook_decimal_odds, MONEY_DP),
            fixed(opp.sportsbook_probability.value(), PROBABILITY_DP),
            opp.sportsbook_date,
            fixed(opp.total_probability, PROBABILITY_DP),
            fixed(opp.theoretical_profit_percent, MONEY_DP),
            fixed(opp.stakes.primary_stake, MONEY_DP),
            fixed(opp.stakes.secondary_stake_same_currency, MONEY_DP),
            fixed(opp.stakes.secondary_stake_converted, MONEY_DP),
            fixed(opp.stakes.guaranteed_profit, MONEY_DP),
        );
        out.push_str(&"-".repeat(50));
        out.push_str("\n\n");
    }

    out
}

/// Round to `dp` places, then pad to exactly `dp` places. `Decimal`'s own
/// precision formatting truncates.
fn fixed(value: Decimal, dp: u32) -> String {
    format!("{:.*}", dp as usize, value.round_dp(dp))
}

/// Name of the report written at `now`.
pub fn report_file_name(now: DateTime<Utc>) -> String {
    format!("{REPORT_PREFIX}{}{REPORT_EXTENSION}", now.format("%Y%m%d_%H%M%S"))
}

fn is_report(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(REPORT_PREFIX) && n.ends_with(REPORT_EXTENSION))
}

/// Writes the report of a run into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    labels: CurrencyLabels,
}

impl ReportWriter {
    /// Create a writer for `dir`.
    pub fn new(dir: impl Into<PathBuf>, labels: CurrencyLabels) -> Self {
        Self {
            dir: dir.into(),
            labels,
        }
    }

    /// Replace any prior report with one for `opportunities`.
    pub fn write(
        &self,
        opportunities: &[ArbitrageOpportunity],
        now: DateTime<Utc>,
    ) -> Result<PathBuf, ReportError> {
        let dir_err = |source| ReportError::Directory {
            path: self.dir.clone(),
            source,
        };
        let file_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ReportError::File { path, source }
        };

        fs::create_dir_all(&self.dir).map_err(dir_err)?;

        let tmp = self.dir.join(TMP_NAME);
        fs::write(&tmp, render(opportunities, &self.labels)).map_err(file_err(&tmp))?;

        for entry in fs::read_dir(&self.dir).map_err(dir_err)? {
            let path = entry.map_err(dir_err)?.path();
            if is_report(&path) {
                debug!(path = %path.display(), "Removing previous report");
                fs::remove_file(&path).map_err(file_err(&path))?;
            }
        }

        let target = self.dir.join(report_file_name(now));
        fs::rename(&tmp, &target).map_err(file_err(&target))?;

        info!(
            path = %target.display(),
            opportunities = opportunities.len(),
            "Wrote report"
        );
        Ok(target)
    }
}
