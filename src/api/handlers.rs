//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::error;

use crate::model::MatchRecord;
use crate::store::MatchStore;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether the consumer is subscribed and processing.
    ready: Arc<AtomicBool>,
    /// Persistence gateway the read endpoints query.
    store: Arc<dyn MatchStore>,
}

impl AppState {
    /// Create new app state over a store.
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            store,
        }
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether the consumer is subscribed.
    pub ready: bool,
}

/// All persisted match records.
#[derive(Debug, Serialize)]
pub struct MatchesResponse {
    /// Persisted records, ordered by fixture id.
    pub matches: Vec<MatchRecord>,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let response = ReadyResponse { ready: is_ready };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Live matches handler - returns all currently persisted records.
pub async fn matches(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.all_matches().await {
        Ok(matches) => (StatusCode::OK, Json(MatchesResponse { matches })).into_response(),
        Err(e) => {
            error!(error = %e, "failed to load matches");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
