//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::odds::{OddsCache, OddsSource};

/// Application state shared with handlers.
pub struct AppState<S> {
    /// Odds cache. The lock allows one upstream refresh at a time.
    pub cache: Arc<Mutex<OddsCache<S>>>,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            metrics: self.metrics.clone(),
        }
    }
}

impl<S: OddsSource> AppState<S> {
    /// Create new app state.
    pub fn new(cache: OddsCache<S>, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
            metrics,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Odds for a sport in snapshot form, served through the cache.
pub async fn sport_odds<S: OddsSource + 'static>(
    State(state): State<AppState<S>>,
    Path(sport): Path<String>,
) -> Response {
    info!(sport = %sport, "Odds requested");
    let result = state.cache.lock().await.get(&sport).await;

    match result {
        Ok(board) => (StatusCode::OK, Json(board.to_snapshot())).into_response(),
        Err(e) => {
            error!(sport = %sport, error = %e, "Failed to retrieve odds data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to retrieve odds data".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Prometheus text exposition.
pub async fn metrics<S: OddsSource + 'static>(State(state): State<AppState<S>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
