use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, instrument};

use super::dto::{SampleQuery, SampleResponse, SessionView};
use super::interpreter::sample_payload;
use super::services::{Intent, SessionError};
use crate::state::AppState;

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/scanner/start", post(start_scanner))
        .route("/scanner/stop", post(stop_scanner))
        .route("/scanner/toggle", post(toggle_scanner))
}

pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/scan/claim", post(claim))
        .route("/scan/donate", post(donate))
        .route("/scan/dismiss", post(dismiss))
        .route("/redeem", post(redeem))
}

pub fn qr_routes() -> Router<AppState> {
    Router::new().route("/qr/sample", get(sample))
}

type ViewResult = Result<Json<SessionView>, (StatusCode, String)>;

async fn run(state: &AppState, intent: Intent) -> ViewResult {
    state.session.send(intent).await.map(Json).map_err(unavailable)
}

#[instrument(skip(state))]
pub async fn get_session(State(state): State<AppState>) -> ViewResult {
    run(&state, Intent::View).await
}

#[instrument(skip(state))]
pub async fn start_scanner(State(state): State<AppState>) -> ViewResult {
    run(&state, Intent::StartScanner).await
}

#[instrument(skip(state))]
pub async fn stop_scanner(State(state): State<AppState>) -> ViewResult {
    run(&state, Intent::StopScanner).await
}

#[instrument(skip(state))]
pub async fn toggle_scanner(State(state): State<AppState>) -> ViewResult {
    run(&state, Intent::ToggleScanner).await
}

#[instrument(skip(state))]
pub async fn claim(State(state): State<AppState>) -> ViewResult {
    run(&state, Intent::Claim).await
}

#[instrument(skip(state))]
pub async fn donate(State(state): State<AppState>) -> ViewResult {
    run(&state, Intent::Donate).await
}

#[instrument(skip(state))]
pub async fn dismiss(State(state): State<AppState>) -> ViewResult {
    run(&state, Intent::Dismiss).await
}

#[instrument(skip(state))]
pub async fn redeem(State(state): State<AppState>) -> ViewResult {
    run(&state, Intent::Redeem).await
}

#[instrument]
pub async fn sample(Query(query): Query<SampleQuery>) -> Json<SampleResponse> {
    let points = query.points();
    Json(SampleResponse {
        points,
        payload: sample_payload(points, OffsetDateTime::now_utc()),
    })
}

pub(crate) fn unavailable(e: SessionError) -> (StatusCode, String) {
    error!(error = %e, "session call failed");
    (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn claim_without_pending_scan_answers_current_view() {
        let state = AppState::fake().await;
        let Json(view) = claim(State(state.clone())).await.expect("claim");
        assert!(!view.logged_in);
        assert_eq!(view.points, 0);
    }

    #[tokio::test]
    async fn sample_payload_defaults_to_ten_points() {
        let Json(res) = sample(Query(SampleQuery { points: None })).await;
        assert_eq!(res.points, 10);
        assert_eq!(crate::rewards::interpreter::extract_points(&res.payload), 10);
    }

    #[tokio::test]
    async fn sample_payload_scans_for_requested_points() {
        let state = AppState::fake().await;
        let Json(res) = sample(Query(SampleQuery { points: Some(300) })).await;
        assert!(res.payload.contains("segro-reward"));

        state
            .session
            .send(Intent::Login {
                email: "demo@segro.app".into(),
                password: "secret".into(),
            })
            .await
            .expect("login");
        state.session.send(Intent::StartScanner).await.expect("start");
        state
            .session
            .deliver(crate::scanner::DecodeEvent::Decoded(res.payload))
            .await
            .expect("deliver");
        let Json(view) = claim(State(state.clone())).await.expect("claim");
        assert_eq!(view.points, 400);
    }

    #[tokio::test]
    async fn unavailable_maps_to_503() {
        let (status, msg) = unavailable(SessionError::Stopped);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(msg.contains("not running"));
    }
}
