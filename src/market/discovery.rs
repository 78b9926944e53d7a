//! Prediction market event discovery via the Gamma API.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::MarketError;
use crate::matching::{in_reference_zone, parse_timestamp};
use crate::metrics::{self, SkipReason};

/// Format of `endDate` in the prediction-market snapshot.
pub const SNAPSHOT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

static NBA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(NBA|nba)\b").expect("valid regex"));

/// Gamma event reduced to the fields the snapshot keeps. Markets are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GammaEvent {
    /// Event identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Event title.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Event ticker.
    #[serde(default)]
    pub ticker: Option<String>,
    /// Event description.
    #[serde(default)]
    pub description: Option<String>,
    /// End date.
    #[serde(rename = "endDate", default)]
    pub end_date: Option<String>,
    /// Raw markets.
    #[serde(default)]
    pub markets: Vec<Value>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl GammaEvent {
    fn is_nba(&self) -> bool {
        [Some(self.title.as_str()), self.ticker.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .any(|field| NBA_PATTERN.is_match(field))
    }
}

/// Gamma events API client.
#[derive(Debug, Clone)]
pub struct GammaClient {
    http: reqwest::Client,
    url: String,
    page_limit: usize,
}

impl GammaClient {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self, MarketError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            http,
            url: config.gamma_api_url.clone(),
            page_limit: config.gamma_page_limit,
        })
    }

    /// Page through every active, open event.
    ///
    /// Paging stops at the first short page. A failed page after the first
    /// ends paging with what was collected so far.
    #[instrument(skip(self))]
    pub async fn fetch_all_events(&self) -> Result<Vec<Value>, MarketError> {
        let mut events = Vec::new();
        let mut offset = 0;

        loop {
            let page = match self.fetch_page(offset).await {
                Ok(page) => page,
                Err(e) if offset == 0 => return Err(e),
                Err(e) => {
                    warn!(offset, error = %e, "Stopping pagination early");
                    break;
                }
            };

            let count = page.len();
            debug!(offset, count, "Fetched events page");
            events.extend(page);

            if count < self.page_limit {
                break;
            }
            offset += self.page_limit;
        }

        info!(total = events.len(), "Fetched prediction market events");
        Ok(events)
    }

    async fn fetch_page(&self, offset: usize) -> Result<Vec<Value>, MarketError> {
        let offset_param = offset.to_string();
        let limit_param = self.page_limit.to_string();
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("offset", offset_param.as_str()),
                ("limit", limit_param.as_str()),
                ("active", "true"),
                ("closed", "false"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                offset,
                reason: format!("HTTP {}", response.status()),
            });
        }

        response.json().await.map_err(|e| MarketError::FetchFailed {
            offset,
            reason: e.to_string(),
        })
    }
}

/// Keep upcoming NBA events, with `endDate` rewritten in the reference zone,
/// sorted by distance from `now`. Undated events are kept and sort last.
pub fn filter_nba_events(raw: Vec<Value>, now: DateTime<Utc>) -> Vec<GammaEvent> {
    let mut kept: Vec<(Option<i64>, GammaEvent)> = Vec::new();

    for value in raw {
        let mut event: GammaEvent = match serde_json::from_value(value) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "Skipping undecodable event");
                continue;
            }
        };

        if !event.is_nba() {
            continue;
        }

        let distance = match event.end_date.as_deref() {
            None => None,
            Some(raw_date) => {
                let ends_at = match parse_timestamp(raw_date) {
                    Ok(ts) => ts.with_timezone(&Utc),
                    Err(e) => {
                        warn!(title = %event.title, error = %e, "Skipping event");
                        metrics::inc_events_skipped(SkipReason::InvalidTimestamp);
                        continue;
                    }
                };
                if ends_at < now {
                    debug!(title = %event.title, "Skipping past event");
                    continue;
                }
                event.end_date = Some(
                    in_reference_zone(ends_at)
                        .format(SNAPSHOT_DATE_FORMAT)
                        .to_string(),
                );
                Some((ends_at - now).num_seconds().abs())
            }
        };

        kept.push((distance, event));
    }

    // Stable: equal distances keep input order.
    kept.sort_by_key(|(distance, _)| distance.unwrap_or(i64::MAX));
    info!(count = kept.len(), "Kept NBA events");
    kept.into_iter().map(|(_, event)| event).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-11-14T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn keeps_nba_events_by_title_ticker_or_description() {
        let raw = vec![
            json!({"id": "1", "title": "NBA: Lakers vs. Celtics", "endDate": "2024-11-15T03:00:00Z"}),
            json!({"id": "2", "title": "Heat vs. Bulls", "ticker": "nba-mia-chi", "endDate": "2024-11-15T01:00:00Z"}),
            json!({"id": "3", "title": "Knicks vs. Nets", "description": "An nba game", "endDate": "2024-11-15T02:00:00Z"}),
            json!({"id": "4", "title": "Who wins the NBAX cup?", "endDate": "2024-11-15T02:00:00Z"}),
            json!({"id": "5", "title": "Presidential election", "endDate": "2024-11-15T02:00:00Z"}),
        ];

        let kept: Vec<String> = filter_nba_events(raw, now())
            .into_iter()
            .filter_map(|e| e.id)
            .collect();
        assert_eq!(kept, vec!["2", "3", "1"]);
    }

    #[test]
    fn drops_past_and_unparseable_events() {
        let raw = vec![
            json!({"id": "past", "title": "NBA game", "endDate": "2024-11-14T11:59:59Z"}),
            json!({"id": "bad", "title": "NBA game", "endDate": "soon"}),
            json!({"id": "undated", "title": "NBA game"}),
            json!({"id": "future", "title": "NBA game", "endDate": "2024-11-20T00:00:00Z"}),
        ];

        let kept: Vec<String> = filter_nba_events(raw, now())
            .into_iter()
            .filter_map(|e| e.id)
            .collect();
        assert_eq!(kept, vec!["future", "undated"]);
    }

    #[test]
    fn rewrites_end_date_in_eastern_time() {
        let raw = vec![json!({
            "id": "1",
            "title": "NBA: Lakers vs. Celtics",
            "endDate": "2024-11-15T03:00:00Z",
            "markets": [{"outcomes": "[\"Lakers\", \"Celtics\"]", "volume": 1000}]
        })];

        let kept = filter_nba_events(raw, now());
        assert_eq!(kept[0].end_date.as_deref(), Some("2024-11-14 22:00:00-0500"));
        assert_eq!(kept[0].markets[0]["volume"], json!(1000));
    }

    #[test]
    fn null_title_is_empty() {
        let event: GammaEvent =
            serde_json::from_value(json!({"title": null, "ticker": "nba"})).unwrap();
        assert_eq!(event.title, "");
        assert!(event.is_nba());
    }
}
