//! NBA franchise names and the canonical short form used as the join key
//! between the prediction market and the sportsbooks.
//!
//! Sportsbooks quote fully-qualified names ("Los Angeles Lakers") while
//! Polymarket titles use the short form ("Lakers vs. Celtics"). Both sides
//! are reduced to the short form before comparison.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{ArbitrageError, EventError};

/// Full franchise name → canonical short name, one entry per franchise.
const FRANCHISES: &[(&str, &str)] = &[
    ("Atlanta Hawks", "Hawks"),
    ("Boston Celtics", "Celtics"),
    ("Brooklyn Nets", "Nets"),
    ("Charlotte Hornets", "Hornets"),
    ("Chicago Bulls", "Bulls"),
    ("Cleveland Cavaliers", "Cavaliers"),
    ("Dallas Mavericks", "Mavericks"),
    ("Denver Nuggets", "Nuggets"),
    ("Detroit Pistons", "Pistons"),
    ("Golden State Warriors", "Warriors"),
    ("Houston Rockets", "Rockets"),
    ("Indiana Pacers", "Pacers"),
    ("Los Angeles Clippers", "Clippers"),
    ("Los Angeles Lakers", "Lakers"),
    ("Memphis Grizzlies", "Grizzlies"),
    ("Miami Heat", "Heat"),
    ("Milwaukee Bucks", "Bucks"),
    ("Minnesota Timberwolves", "Timberwolves"),
    ("New Orleans Pelicans", "Pelicans"),
    ("New York Knicks", "Knicks"),
    ("Oklahoma City Thunder", "Thunder"),
    ("Orlando Magic", "Magic"),
    ("Philadelphia 76ers", "76ers"),
    ("Phoenix Suns", "Suns"),
    ("Portland Trail Blazers", "Trail Blazers"),
    ("Sacramento Kings", "Kings"),
    ("San Antonio Spurs", "Spurs"),
    ("Toronto Raptors", "Raptors"),
    ("Utah Jazz", "Jazz"),
    ("Washington Wizards", "Wizards"),
];

/// Alternate spellings seen in bookmaker feeds.
const ALIASES: &[(&str, &str)] = &[
    ("LA Clippers", "Clippers"),
    ("LA Lakers", "Lakers"),
    ("Blazers", "Trail Blazers"),
    ("Sixers", "76ers"),
];

static NAME_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| FRANCHISES.iter().chain(ALIASES).copied().collect());

/// Every name the title tokenizer recognizes, canonical forms included.
static KNOWN_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    FRANCHISES
        .iter()
        .chain(ALIASES)
        .flat_map(|(long, short)| [*long, *short])
        .collect()
});

/// Word count of the longest known name.
static MAX_NAME_WORDS: Lazy<usize> = Lazy::new(|| {
    KNOWN_NAMES
        .iter()
        .map(|name| name.split_whitespace().count())
        .max()
        .unwrap_or(1)
});

/// Matchup separators accepted in titles, longest first.
const SEPARATORS: &[&str] = &[" vs. ", " vs ", " @ "];

/// Map a franchise name to its canonical short form.
///
/// Unknown names (including names already in short form) pass through
/// trimmed but otherwise unchanged.
pub fn normalize(name: &str) -> String {
    let trimmed = name.trim();
    NAME_TABLE
        .get(trimmed)
        .map(|short| (*short).to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Canonical short names of all 30 franchises.
pub fn canonical_names() -> impl Iterator<Item = &'static str> {
    FRANCHISES.iter().map(|(_, short)| *short)
}

/// Parse a matchup title such as `"Trail Blazers vs. Lakers"` into its two
/// team tokens.
///
/// Each side of the separator is scanned for the longest known franchise
/// name; a side with no recognizable name contributes its trimmed text.
pub fn extract_teams_from_title(title: &str) -> Result<TeamSet, EventError> {
    let (left, right) = split_matchup(title)
        .ok_or_else(|| EventError::TeamCount(vec![title.trim().to_string()]))?;

    TeamSet::new([team_token(left), team_token(right)])
}

fn split_matchup(title: &str) -> Option<(&str, &str)> {
    SEPARATORS.iter().find_map(|sep| {
        let (left, right) = title.split_once(sep)?;
        (!left.trim().is_empty() && !right.trim().is_empty()).then_some((left, right))
    })
}

/// Longest-match-first scan of one side of a matchup title.
fn team_token(side: &str) -> String {
    let words: Vec<&str> = side
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();

    let mut best: Option<String> = None;
    for start in 0..words.len() {
        let longest = (*MAX_NAME_WORDS).min(words.len() - start);
        for len in (1..=longest).rev() {
            let candidate = words[start..start + len].join(" ");
            if KNOWN_NAMES.contains(candidate.as_str()) {
                let is_longer = best
                    .as_ref()
                    .map_or(true, |b| b.split_whitespace().count() < len);
                if is_longer {
                    best = Some(candidate);
                }
                break;
            }
        }
    }

    best.unwrap_or_else(|| side.trim().to_string())
}

/// The two canonical teams of a game. Order is irrelevant to equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TeamSet(BTreeSet<String>);

impl TeamSet {
    /// Normalize the given names and require exactly two distinct teams.
    pub fn new<I, S>(names: I) -> Result<Self, EventError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = names
            .into_iter()
            .map(|n| normalize(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();

        if set.len() != 2 {
            return Err(EventError::TeamCount(set.into_iter().collect()));
        }
        Ok(Self(set))
    }

    /// Whether the (normalized) team plays in this game.
    pub fn contains(&self, team: &str) -> bool {
        self.0.contains(&normalize(team))
    }

    /// The other team in the game.
    pub fn opponent_of(&self, team: &str) -> Result<&str, ArbitrageError> {
        let team = normalize(team);
        let rest: Vec<&String> = self.0.iter().filter(|t| **t != team).collect();
        match rest.as_slice() {
            [only] => Ok(only.as_str()),
            _ => Err(ArbitrageError::AmbiguousOpponent {
                team,
                candidates: rest.into_iter().cloned().collect(),
            }),
        }
    }

    /// Teams in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for TeamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let teams: Vec<&str> = self.iter().collect();
        write!(f, "{{{}}}", teams.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(a: &str, b: &str) -> TeamSet {
        TeamSet::new([a, b]).unwrap()
    }

    #[test]
    fn table_covers_every_franchise() {
        assert_eq!(FRANCHISES.len(), 30);
        let shorts: HashSet<&str> = canonical_names().collect();
        assert_eq!(shorts.len(), 30);
    }

    #[test]
    fn normalize_maps_full_names() {
        assert_eq!(normalize("Los Angeles Lakers"), "Lakers");
        assert_eq!(normalize("Portland Trail Blazers"), "Trail Blazers");
        assert_eq!(normalize("Philadelphia 76ers"), "76ers");
        assert_eq!(normalize("Orlando Magic"), "Magic");
        assert_eq!(normalize("LA Clippers"), "Clippers");
    }

    #[test]
    fn normalize_passes_unknown_through() {
        assert_eq!(normalize("Lakers"), "Lakers");
        assert_eq!(normalize("Seattle SuperSonics"), "Seattle SuperSonics");
        assert_eq!(normalize("  Celtics "), "Celtics");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = FRANCHISES
            .iter()
            .chain(ALIASES)
            .flat_map(|(l, s)| [*l, *s])
            .chain(["Seattle SuperSonics", "", "  Heat  ", "Vancouver Grizzlies"]);

        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn extract_simple_title() {
        assert_eq!(
            extract_teams_from_title("Clippers vs. Thunder").unwrap(),
            set("Clippers", "Thunder")
        );
    }

    #[test]
    fn extract_keeps_multi_word_names_whole() {
        assert_eq!(
            extract_teams_from_title("Trail Blazers vs. Lakers").unwrap(),
            set("Trail Blazers", "Lakers")
        );
        assert_eq!(
            extract_teams_from_title("Lakers vs. Trail Blazers").unwrap(),
            set("Trail Blazers", "Lakers")
        );
    }

    #[test]
    fn extract_handles_full_names_and_prefixes() {
        assert_eq!(
            extract_teams_from_title("Portland Trail Blazers vs. Golden State Warriors").unwrap(),
            set("Trail Blazers", "Warriors")
        );
        assert_eq!(
            extract_teams_from_title("NBA: Knicks vs. 76ers").unwrap(),
            set("Knicks", "76ers")
        );
    }

    #[test]
    fn extract_falls_back_to_raw_side() {
        assert_eq!(
            extract_teams_from_title("Sonics vs. Lakers").unwrap(),
            set("Sonics", "Lakers")
        );
    }

    #[test]
    fn extract_rejects_non_matchups() {
        assert!(extract_teams_from_title("NBA Champion 2025").is_err());
        assert!(extract_teams_from_title("Lakers vs. Lakers").is_err());
    }

    #[test]
    fn team_set_ignores_order_and_normalizes() {
        assert_eq!(
            TeamSet::new(["Boston Celtics", "Miami Heat"]).unwrap(),
            set("Heat", "Celtics")
        );
    }

    #[test]
    fn team_set_requires_two_teams() {
        assert!(TeamSet::new(["Heat"]).is_err());
        assert!(TeamSet::new(["Heat", "Miami Heat"]).is_err());
        assert!(TeamSet::new(["Heat", "Celtics", "Bulls"]).is_err());
    }

    #[test]
    fn opponent_resolution() {
        let teams = set("Heat", "Celtics");
        assert_eq!(teams.opponent_of("Heat").unwrap(), "Celtics");
        assert_eq!(teams.opponent_of("Boston Celtics").unwrap(), "Heat");
        assert!(teams.opponent_of("Bulls").is_err());
    }
}
