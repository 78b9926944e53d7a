//! Integration tests for the NBA arbitrage scanner.
//!
//! The pipeline tests run from JSON fixtures. The live tests need
//! `ODDS_API_KEY` and network access.
//! Run them with: cargo test --test integration -- --ignored

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use nba_arb::config::Config;
use nba_arb::error::{ScanError, SnapshotError};
use nba_arb::market::{filter_nba_events, GammaClient};
use nba_arb::odds::OddsApiClient;
use nba_arb::pipeline::{scan, scan_blocking};
use nba_arb::report::NO_OPPORTUNITIES;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tempfile::TempDir;

const PREDICTION_SNAPSHOT: &str = r#"[
    {
        "id": "9001",
        "title": "Heat vs. Bulls",
        "ticker": "nba-mia-chi-2024-11-14",
        "description": "NBA regular season",
        "endDate": "2024-11-14 20:00:00-0500",
        "markets": [
            {"outcomes": "[\"Heat\", \"Bulls\"]", "outcomePrices": "[\"0.55\", \"0.40\"]"}
        ]
    },
    {
        "id": "9002",
        "title": "Trail Blazers vs. Lakers",
        "endDate": "2024-11-14 22:00:00-0500",
        "markets": [
            {"outcomes": "[\"Trail Blazers\", \"Lakers\"]", "outcomePrices": "[\"0.30\", \"0.75\"]"}
        ]
    },
    {
        "id": "9003",
        "title": "Knicks vs. Nets",
        "endDate": "2024-11-13 19:00:00-0500",
        "markets": [
            {"outcomes": "[\"Knicks\", \"Nets\"]", "outcomePrices": "[\"0.10\", \"0.10\"]"}
        ]
    },
    {
        "id": "9004",
        "title": "Celtics vs. Magic",
        "endDate": "not a date",
        "markets": []
    }
]"#;

const SPORTSBOOK_SNAPSHOT: &str = r#"{
    "odds_data": {
        "Game 1": {
            "away_team": "Chicago Bulls",
            "home_team": "Miami Heat",
            "commence_time": "2024-11-15 01:00:00",
            "bookmakers": [
                {"name": "FanDuel", "last_update": "2024-11-14 16:00:00",
                 "odds": {"Chicago Bulls": 2.5, "Miami Heat": 1.6}},
                {"name": "DraftKings", "last_update": "2024-11-14 16:05:00",
                 "odds": {"Chicago Bulls": 2.63, "Miami Heat": 1.55}}
            ],
            "missing_bookmakers": []
        },
        "Game 2": {
            "away_team": "Portland Trail Blazers",
            "home_team": "Los Angeles Lakers",
            "commence_time": "2024-11-15 03:00:00",
            "bookmakers": [
                {"name": "FanDuel", "last_update": "2024-11-14 16:00:00",
                 "odds": {"Portland Trail Blazers": 3.6, "Los Angeles Lakers": 1.32}}
            ],
            "missing_bookmakers": ["DraftKings"]
        },
        "Game 3": {
            "away_team": "New York Knicks",
            "home_team": "Brooklyn Nets",
            "commence_time": "2024-11-14 00:00:00",
            "bookmakers": [],
            "missing_bookmakers": []
        }
    },
    "remaining_requests": "455"
}"#;

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-11-14T17:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn fixture_config(dir: &Path) -> Config {
    let prediction = dir.join("jsonOutputs/nbaEvents.json");
    let sportsbook = dir.join("jsonOutputs/miraNBAEvents.json");
    fs::create_dir_all(dir.join("jsonOutputs")).unwrap();
    fs::write(&prediction, PREDICTION_SNAPSHOT).unwrap();
    fs::write(&sportsbook, SPORTSBOOK_SNAPSHOT).unwrap();

    Config {
        polymarket_snapshot_path: prediction,
        sportsbook_snapshot_path: sportsbook,
        report_dir: dir.join("arbOutput"),
        ..Config::default()
    }
}

#[test]
fn pipeline_reports_single_opportunity() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(dir.path());

    let outcome = scan(&config, now(), dec!(0.73)).unwrap();

    assert_eq!(outcome.games_matched, 2);
    assert_eq!(outcome.opportunities.len(), 1);

    let opp = &outcome.opportunities[0];
    assert_eq!(opp.prediction_team, "Heat");
    assert_eq!(opp.sportsbook_team, "Bulls");
    assert_eq!(opp.bookmaker, "DraftKings");
    assert_eq!(opp.total_probability, dec!(0.930));
    assert_eq!(opp.theoretical_profit_percent, dec!(7.00));
    assert_eq!(opp.stakes.secondary_stake_converted, dec!(105.66));

    let name = outcome.report_path.file_name().unwrap().to_str().unwrap();
    assert_eq!(name, "arbitrage_opportunities_20241114_170000.txt");

    let report = fs::read_to_string(&outcome.report_path).unwrap();
    assert!(report.starts_with("ARBITRAGE OPPORTUNITIES\n\n"));
    assert!(report.contains("Polymarket Team: Heat (odds: 1.82, prob: 0.550)"));
    assert!(report.contains("Primary Market Team: Bulls (odds: 2.63, prob: 0.380)"));
    assert!(report.contains("Polymarket Bet (USD): $105.66"));
}

#[tokio::test]
async fn scan_runs_off_the_async_runtime() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(dir.path());

    let outcome = scan_blocking(config, now(), dec!(0.73)).await.unwrap();

    assert_eq!(outcome.opportunities.len(), 1);
    assert!(outcome.report_path.exists());
}

#[test]
fn rerun_replaces_previous_report() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(dir.path());

    let first = scan(&config, now(), dec!(0.73)).unwrap();
    let later = now() + chrono::Duration::seconds(90);
    let second = scan(&config, later, dec!(0.73)).unwrap();

    assert!(!first.report_path.exists());
    assert!(second.report_path.exists());
    assert_eq!(fs::read_dir(&config.report_dir).unwrap().count(), 1);
}

#[test]
fn no_matches_still_writes_marker() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(dir.path());

    // Every event has started by then.
    let late = DateTime::parse_from_rfc3339("2024-11-16T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let outcome = scan(&config, late, dec!(0.73)).unwrap();

    assert_eq!(outcome.games_matched, 0);
    assert!(outcome.opportunities.is_empty());
    let report = fs::read_to_string(&outcome.report_path).unwrap();
    assert!(report.contains(NO_OPPORTUNITIES));
}

#[test]
fn malformed_entries_are_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(dir.path());

    let mut sportsbook: serde_json::Value = serde_json::from_str(SPORTSBOOK_SNAPSHOT).unwrap();
    sportsbook["odds_data"]["Game 4"] =
        serde_json::json!({"away_team": "Utah Jazz", "bookmakers": []});
    sportsbook["odds_data"]["Game 1"]["bookmakers"][0]["odds"]["Chicago Bulls"] =
        serde_json::Value::Null;
    fs::write(&config.sportsbook_snapshot_path, sportsbook.to_string()).unwrap();

    let mut prediction: serde_json::Value = serde_json::from_str(PREDICTION_SNAPSHOT).unwrap();
    prediction
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({"id": "9005", "title": null, "markets": 7}));
    fs::write(&config.polymarket_snapshot_path, prediction.to_string()).unwrap();

    let outcome = scan(&config, now(), dec!(0.73)).unwrap();

    assert_eq!(outcome.games_matched, 2);
    assert_eq!(outcome.opportunities.len(), 1);
    assert_eq!(outcome.opportunities[0].bookmaker, "DraftKings");
}

#[test]
fn missing_snapshot_aborts_without_report() {
    let dir = TempDir::new().unwrap();
    let mut config = fixture_config(dir.path());
    config.sportsbook_snapshot_path = dir.path().join("absent.json");

    let err = scan(&config, now(), dec!(0.73)).unwrap_err();

    assert!(matches!(err, ScanError::Snapshot(SnapshotError::NotFound { .. })));
    assert!(!config.report_dir.exists());
}

#[test]
fn corrupt_snapshot_aborts() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(dir.path());
    fs::write(&config.polymarket_snapshot_path, "[{").unwrap();

    let err = scan(&config, now(), dec!(0.73)).unwrap_err();
    assert!(matches!(err, ScanError::Snapshot(SnapshotError::Corrupt { .. })));
}

/// Live fetch from The Odds API.
#[tokio::test]
#[ignore = "requires ODDS_API_KEY and network access"]
async fn live_odds_fetch() {
    let config = Config::load().unwrap();
    let client = OddsApiClient::new(&config).unwrap();

    let board = client.fetch_odds(&config.sport).await.unwrap();
    println!(
        "Fetched {} games, {} requests remaining",
        board.games.len(),
        board.remaining_requests
    );
    assert!(!board.remaining_requests.is_empty());
}

/// Live fetch from the Gamma events API.
#[tokio::test]
#[ignore = "requires network access"]
async fn live_gamma_fetch() {
    let config = Config::default();
    let client = GammaClient::new(&config).unwrap();

    let raw = client.fetch_all_events().await.unwrap();
    let events = filter_nba_events(raw, Utc::now());
    println!("Kept {} NBA events", events.len());
}
