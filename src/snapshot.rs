//! Persisted JSON snapshots of both sources.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, SnapshotError};
use crate::market::PredictionEvent;
use crate::metrics::{self, SkipReason};
use crate::odds::SportsbookGame;

/// Sportsbook snapshot with each game still undecoded.
#[derive(Deserialize)]
struct RawSportsbookSnapshot {
    odds_data: IndexMap<String, Value>,
}

fn load<T: DeserializeOwned>(path: &Path) -> std::result::Result<T, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => SnapshotError::NotFound {
            path: path.to_path_buf(),
        },
        _ => SnapshotError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;

    serde_json::from_str(&raw).map_err(|source| SnapshotError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode one snapshot entry. A malformed entry is logged, counted and dropped.
fn decode_entry<T: DeserializeOwned>(label: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(entry = label, error = %e, "Skipping malformed snapshot entry");
            metrics::inc_events_skipped(SkipReason::MalformedRecord);
            None
        }
    }
}

/// Load the prediction-market snapshot: a JSON array of events.
pub fn load_prediction_snapshot(path: &Path) -> std::result::Result<Vec<PredictionEvent>, SnapshotError> {
    let raw: Vec<Value> = load(path)?;
    let total = raw.len();
    let events: Vec<PredictionEvent> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| decode_entry(&format!("event {index}"), value))
        .collect();
    debug!(path = %path.display(), count = events.len(), total, "Loaded prediction snapshot");
    Ok(events)
}

/// Load the sportsbook snapshot, games in file order.
pub fn load_sportsbook_snapshot(path: &Path) -> std::result::Result<Vec<SportsbookGame>, SnapshotError> {
    let raw: RawSportsbookSnapshot = load(path)?;
    let total = raw.odds_data.len();
    let games: Vec<SportsbookGame> = raw
        .odds_data
        .into_iter()
        .filter_map(|(id, value)| {
            decode_entry::<SportsbookGame>(&id, value).map(|game| SportsbookGame { id, ..game })
        })
        .collect();
    debug!(path = %path.display(), count = games.len(), total, "Loaded sportsbook snapshot");
    Ok(games)
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_snapshot<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    info!(path = %path.display(), "Wrote snapshot");
    Ok(())
}
