//! One scan run: snapshots in, report out.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::arbitrage::{detect, select_best_prices, ArbitrageOpportunity, EventDates, Probability, StakeSizing};
use crate::config::Config;
use crate::error::Result;
use crate::market::PredictionEvent;
use crate::matching::{find_matches, MatchWindow, ScheduledGame};
use crate::metrics::{self, SkipReason};
use crate::odds::{BookmakerQuote, SportsbookGame};
use crate::report::{CurrencyLabels, ReportWriter};
use crate::snapshot::{load_prediction_snapshot, load_sportsbook_snapshot};

/// Result of a completed scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Opportunities in detection order.
    pub opportunities: Vec<ArbitrageOpportunity>,
    /// Number of games paired across the two sources.
    pub games_matched: usize,
    /// Report written for this run.
    pub report_path: PathBuf,
}

/// Match both sources and collect every opportunity, in sportsbook order then
/// prediction-market outcome order.
pub fn find_opportunities(
    prediction: &[PredictionEvent],
    sportsbook: &[SportsbookGame],
    window: MatchWindow,
    sizing: StakeSizing,
) -> (Vec<ArbitrageOpportunity>, usize) {
    let pairs = find_matches(prediction, sportsbook, window);
    let mut opportunities = Vec::new();

    for pair in &pairs {
        let prediction_odds = match pair.prediction.outcome_prices() {
            Ok(odds) => odds,
            Err(e) => {
                warn!(event = pair.prediction.label(), error = %e, "Skipping game");
                metrics::inc_events_skipped(SkipReason::MalformedPrices);
                continue;
            }
        };

        log_book_overround(&pair.sportsbook.bookmakers);
        log_prediction_total(pair.prediction.label(), &prediction_odds);

        let best = select_best_prices(&pair.sportsbook.bookmakers);
        let dates = EventDates {
            prediction: pair.prediction.end_date.clone().unwrap_or_default(),
            sportsbook: pair.sportsbook.commence_time.clone(),
        };

        opportunities.extend(detect(&prediction_odds, &best, &pair.teams, sizing, &dates));
    }

    (opportunities, pairs.len())
}

fn log_book_overround(bookmakers: &[BookmakerQuote]) {
    for book in bookmakers {
        let implied: Vec<(&str, Decimal)> = book
            .odds
            .iter()
            .filter_map(|(team, odds)| {
                Probability::from_decimal_odds(*odds)
                    .ok()
                    .map(|p| (team.as_str(), p.value()))
            })
            .collect();
        let total: Decimal = implied.iter().map(|(_, p)| *p).sum();
        debug!(bookmaker = %book.name, ?implied, %total, "Bookmaker implied probabilities");
    }
}

fn log_prediction_total(label: &str, odds: &[(String, Decimal)]) {
    let total: Decimal = odds.iter().map(|(_, p)| *p).sum();
    debug!(event = label, ?odds, %total, "Prediction market probabilities");
}

/// Load both snapshots, detect opportunities and write the report.
///
/// A missing or corrupt snapshot aborts the run before anything is written.
#[instrument(skip(config))]
pub fn scan(config: &Config, now: DateTime<Utc>, conversion_rate: Decimal) -> Result<ScanOutcome> {
    let prediction = load_prediction_snapshot(&config.polymarket_snapshot_path)?;
    let sportsbook = load_sportsbook_snapshot(&config.sportsbook_snapshot_path)?;
    info!(
        prediction = prediction.len(),
        sportsbook = sportsbook.len(),
        "Loaded snapshots"
    );

    let window = MatchWindow::new(now, config.match_window_secs);
    let sizing = StakeSizing {
        initial_stake: config.initial_stake,
        conversion_rate,
    };
    let (opportunities, games_matched) =
        find_opportunities(&prediction, &sportsbook, window, sizing);

    let writer = ReportWriter::new(
        &config.report_dir,
        CurrencyLabels {
            base: config.base_currency.clone(),
            quote: config.quote_currency.clone(),
        },
    );
    let report_path = writer.write(&opportunities, now)?;

    info!(
        games_matched,
        opportunities = opportunities.len(),
        report = %report_path.display(),
        "Scan complete"
    );

    Ok(ScanOutcome {
        opportunities,
        games_matched,
        report_path,
    })
}

/// [`scan`] on the blocking thread pool, for callers on the async runtime.
/// Snapshot reads and the report write are blocking file IO.
pub async fn scan_blocking(
    config: Config,
    now: DateTime<Utc>,
    conversion_rate: Decimal,
) -> Result<ScanOutcome> {
    tokio::task::spawn_blocking(move || scan(&config, now, conversion_rate)).await?
}
