//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health, matches, ready, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Read surface
        .route("/api/v1/matches", get(matches))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchCandidate, MatchRecord, ScoreOddsMap};
    use crate::normalizer::OutcomeOdds;
    use crate::store::{MatchStore, MemoryMatchStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state_with_store(store: Arc<MemoryMatchStore>) -> AppState {
        AppState::new(store)
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let app = create_router(state_with_store(Arc::new(MemoryMatchStore::new())));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_endpoint_returns_503_when_not_ready() {
        let app = create_router(state_with_store(Arc::new(MemoryMatchStore::new())));

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn ready_endpoint_returns_200_when_ready() {
        let state = state_with_store(Arc::new(MemoryMatchStore::new()));
        state.set_ready(true);
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn matches_endpoint_returns_persisted_records() {
        let store = Arc::new(MemoryMatchStore::new());
        let candidate = MatchCandidate {
            fixture_id: 867946,
            home_team_id: 33,
            home_team_name: "Manchester United".to_string(),
            away_team_id: 40,
            away_team_name: "Liverpool".to_string(),
            score_odds: ScoreOddsMap::new(),
        };
        let record = MatchRecord::from_candidate(
            &candidate,
            OutcomeOdds {
                home_win: 2.35,
                draw: 3.92,
                away_win: 3.13,
            },
        );
        store.persist_batch(&[record]).await.unwrap();

        let app = create_router(state_with_store(store));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/matches")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["matches"][0]["id"], 867946);
        assert_eq!(json["matches"][0]["resultOdds"]["Home Win"], "2.35");
    }
}
