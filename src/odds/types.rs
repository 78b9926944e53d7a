//! Sportsbook odds types: the upstream API response, the fetched board and
//! the persisted snapshot the scanner consumes.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EventError;
use crate::matching::ScheduledGame;
use crate::teams::TeamSet;

/// One bookmaker's moneyline quote for a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerQuote {
    /// Bookmaker display name.
    pub name: String,
    /// Last time the bookmaker updated this quote (UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    /// Team name → decimal odds. Teams quoted as `null` are dropped.
    #[serde(default, deserialize_with = "quoted_odds")]
    pub odds: BTreeMap<String, Decimal>,
}

fn quoted_odds<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, Decimal>, D::Error> {
    let raw = BTreeMap::<String, Option<Decimal>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(team, odds)| odds.map(|odds| (team, odds)))
        .collect())
}

/// A sportsbook game with every bookmaker's quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportsbookGame {
    /// Snapshot key ("Game 3"). Filled in on load.
    #[serde(skip)]
    pub id: String,
    /// Home team full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team: Option<String>,
    /// Away team full name.
    pub away_team: String,
    /// Tip-off time.
    pub commence_time: String,
    /// Quotes, in provider order.
    #[serde(default)]
    pub bookmakers: Vec<BookmakerQuote>,
    /// Bookmakers quoting other games on the board but not this one.
    #[serde(default)]
    pub missing_bookmakers: Vec<String>,
}

impl ScheduledGame for SportsbookGame {
    fn label(&self) -> &str {
        &self.id
    }

    fn start_time(&self) -> Option<&str> {
        Some(&self.commence_time)
    }

    /// Teams named by the game itself plus those quoted by the first
    /// bookmaker; after normalization they must collapse to two.
    fn team_set(&self) -> Result<TeamSet, EventError> {
        let quoted = self
            .bookmakers
            .first()
            .into_iter()
            .flat_map(|b| b.odds.keys().map(String::as_str));

        TeamSet::new(
            std::iter::once(self.away_team.as_str())
                .chain(self.home_team.as_deref())
                .chain(quoted),
        )
    }
}

/// Persisted sportsbook snapshot, also the body served by the odds server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SportsbookSnapshot {
    /// Games keyed "Game 1", "Game 2", ... in provider order.
    pub odds_data: IndexMap<String, SportsbookGame>,
    /// Remaining upstream quota when the snapshot was taken.
    #[serde(default)]
    pub remaining_requests: Option<String>,
}

/// Odds fetched from the upstream provider for one sport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OddsBoard {
    /// Games in provider order.
    pub games: Vec<SportsbookGame>,
    /// Value of the `x-requests-remaining` header.
    pub remaining_requests: String,
}

impl OddsBoard {
    /// Build the snapshot form, listing per game the bookmakers that quote
    /// elsewhere on the board but not on that game.
    pub fn to_snapshot(&self) -> SportsbookSnapshot {
        let all_bookmakers: BTreeSet<&str> = self
            .games
            .iter()
            .flat_map(|g| g.bookmakers.iter().map(|b| b.name.as_str()))
            .collect();

        let odds_data = self
            .games
            .iter()
            .enumerate()
            .map(|(index, game)| {
                let present: BTreeSet<&str> =
                    game.bookmakers.iter().map(|b| b.name.as_str()).collect();
                let missing = all_bookmakers
                    .difference(&present)
                    .map(|name| (*name).to_string())
                    .collect();

                let key = format!("Game {}", index + 1);
                let game = SportsbookGame {
                    id: key.clone(),
                    missing_bookmakers: missing,
                    ..game.clone()
                };
                (key, game)
            })
            .collect();

        SportsbookSnapshot {
            odds_data,
            remaining_requests: Some(self.remaining_requests.clone()),
        }
    }
}

/// Raw event from The Odds API `/sports/{sport}/odds` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEvent {
    /// Home team.
    pub home_team: String,
    /// Away team.
    pub away_team: String,
    /// RFC 3339 tip-off time.
    pub commence_time: String,
    /// Bookmaker quotes.
    #[serde(default)]
    pub bookmakers: Vec<ApiBookmaker>,
}

/// Raw bookmaker entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiBookmaker {
    /// Display name.
    pub title: String,
    /// RFC 3339 update time.
    pub last_update: String,
    /// Markets; only the first (h2h) is read.
    #[serde(default)]
    pub markets: Vec<ApiMarket>,
}

/// Raw market entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMarket {
    /// Outcome prices.
    #[serde(default)]
    pub outcomes: Vec<ApiOutcome>,
}

/// Raw outcome entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiOutcome {
    /// Team name.
    pub name: String,
    /// Decimal odds.
    pub price: Decimal,
}
