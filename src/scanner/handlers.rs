use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::camera::Lens;
use super::dto::{CameraResponse, CameraStatusRequest, FrameRequest};
use crate::state::AppState;

pub fn camera_routes() -> Router<AppState> {
    Router::new()
        .route("/camera", get(get_camera))
        .route("/camera/frame", put(put_frame))
        .route("/camera/status", put(put_status))
}

impl From<Lens> for CameraResponse {
    fn from(lens: Lens) -> Self {
        Self {
            available: lens.fault.is_none(),
            frame: lens.frame,
            fault: lens.fault,
        }
    }
}

#[instrument(skip(state))]
pub async fn get_camera(State(state): State<AppState>) -> Json<CameraResponse> {
    Json(state.camera.lens().into())
}

#[instrument(skip(state, body))]
pub async fn put_frame(
    State(state): State<AppState>,
    Json(body): Json<FrameRequest>,
) -> Json<CameraResponse> {
    info!(has_code = body.data.is_some(), "camera frame updated");
    state.camera.show(body.data);
    Json(state.camera.lens().into())
}

#[instrument(skip(state, body))]
pub async fn put_status(
    State(state): State<AppState>,
    Json(body): Json<CameraStatusRequest>,
) -> Json<CameraResponse> {
    info!(available = body.available, "camera status updated");
    state.camera.set_available(body.available, body.reason);
    Json(state.camera.lens().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_and_status_round_trip_through_state() {
        let state = AppState::fake().await;
        let Json(res) = put_frame(
            State(state.clone()),
            Json(FrameRequest {
                data: Some("reward 5".into()),
            }),
        )
        .await;
        assert_eq!(res.frame.as_deref(), Some("reward 5"));
        assert!(res.available);

        let Json(res) = put_status(
            State(state.clone()),
            Json(CameraStatusRequest {
                available: false,
                reason: Some("denied".into()),
            }),
        )
        .await;
        assert!(!res.available);
        assert_eq!(res.fault.as_deref(), Some("denied"));

        let Json(res) = get_camera(State(state)).await;
        assert_eq!(res.frame.as_deref(), Some("reward 5"));
    }
}
