//! The Odds API client.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::OddsError;
use crate::metrics::{self, SkipReason};

use super::types::{ApiBookmaker, ApiEvent, BookmakerQuote, OddsBoard, SportsbookGame};

/// Header carrying the remaining request quota.
pub const REMAINING_REQUESTS_HEADER: &str = "x-requests-remaining";

/// Wall-clock format of every time the fetcher emits, always UTC.
pub const UTC_WALL_CLOCK: &str = "%Y-%m-%d %H:%M:%S";

/// Client for moneyline odds from The Odds API.
#[derive(Debug, Clone)]
pub struct OddsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    regions: String,
}

impl OddsApiClient {
    /// Create a client from config. Fails if no API key is configured.
    pub fn new(config: &Config) -> Result<Self, OddsError> {
        let api_key = config.require_odds_api_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.odds_api_url.trim_end_matches('/').to_string(),
            api_key,
            regions: config.odds_regions.clone(),
        })
    }

    fn odds_url(&self, sport: &str) -> Result<Url, OddsError> {
        let mut url = Url::parse(&format!("{}/sports/{}/odds", self.base_url, sport))?;
        url.query_pairs_mut()
            .append_pair("apiKey", &self.api_key)
            .append_pair("regions", &self.regions)
            .append_pair("markets", "h2h")
            .append_pair("oddsFormat", "decimal");
        Ok(url)
    }

    /// Fetch the current moneyline board for a sport.
    #[instrument(skip(self))]
    pub async fn fetch_odds(&self, sport: &str) -> Result<OddsBoard, OddsError> {
        let _timer = metrics::timer_odds_fetch();
        let url = self.odds_url(sport)?;

        let response = self.http.get(url).send().await.map_err(|e| {
            warn!(error = %e, "Odds request failed");
            OddsError::Http(e)
        })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(OddsError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(OddsError::RateLimited),
            status if !status.is_success() => {
                return Err(OddsError::Status {
                    status: status.as_u16(),
                })
            }
            _ => {}
        }

        let remaining = response
            .headers()
            .get(REMAINING_REQUESTS_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Unknown")
            .to_string();

        let raw: Vec<Value> = response
            .json()
            .await
            .map_err(|e| OddsError::Parse(e.to_string()))?;

        let events = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<ApiEvent>(value) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed odds event");
                    metrics::inc_events_skipped(SkipReason::MalformedRecord);
                    None
                }
            })
            .collect();

        let board = build_board(events, remaining);
        info!(
            games = board.games.len(),
            remaining_requests = %board.remaining_requests,
            "Fetched odds"
        );
        Ok(board)
    }
}

/// Convert the raw API payload into a board. Events with an unparseable
/// tip-off time are dropped.
pub fn build_board(events: Vec<ApiEvent>, remaining_requests: String) -> OddsBoard {
    let games = events
        .into_iter()
        .filter_map(|event| {
            let label = format!("{} @ {}", event.away_team, event.home_team);
            match convert_event(event) {
                Ok(game) => Some(game),
                Err(e) => {
                    warn!(event = %label, error = %e, "Skipping odds event");
                    metrics::inc_events_skipped(SkipReason::InvalidTimestamp);
                    None
                }
            }
        })
        .collect();

    OddsBoard {
        games,
        remaining_requests,
    }
}

fn convert_event(event: ApiEvent) -> Result<SportsbookGame, OddsError> {
    let commence_time = to_utc_wall_clock(&event.commence_time)?;
    let bookmakers = event.bookmakers.into_iter().map(convert_bookmaker).collect();

    Ok(SportsbookGame {
        id: String::new(),
        home_team: Some(event.home_team),
        away_team: event.away_team,
        commence_time,
        bookmakers,
        missing_bookmakers: Vec::new(),
    })
}

fn convert_bookmaker(bookmaker: ApiBookmaker) -> BookmakerQuote {
    let last_update = to_utc_wall_clock(&bookmaker.last_update)
        .map_err(|e| debug!(bookmaker = %bookmaker.title, error = %e, "Dropping last_update"))
        .ok();

    // Only the first market is the moneyline.
    let odds = match bookmaker.markets.into_iter().next() {
        Some(market) => market
            .outcomes
            .into_iter()
            .map(|o| (o.name, o.price))
            .collect(),
        None => {
            debug!(bookmaker = %bookmaker.title, "Bookmaker has no market");
            Default::default()
        }
    };

    BookmakerQuote {
        name: bookmaker.title,
        last_update,
        odds,
    }
}

fn to_utc_wall_clock(raw: &str) -> Result<String, OddsError> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| OddsError::Parse(format!("timestamp {raw:?}: {e}")))?;
    Ok(parsed.with_timezone(&Utc).format(UTC_WALL_CLOCK).to_string())
}
