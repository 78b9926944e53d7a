//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health, metrics, sport_odds, AppState};
use crate::odds::OddsSource;

/// Create the API router.
pub fn create_router<S: OddsSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/:sport/odds", get(sport_odds::<S>))
        .route("/metrics", get(metrics::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
