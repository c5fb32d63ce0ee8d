//! Boundary to the QR-decoding side: a virtual camera and the scan loop that
//! turns what the camera sees into [`DecodeEvent`]s for the reward session.

pub mod camera;
mod dto;
pub mod handlers;
pub mod services;

pub use camera::Camera;
pub use services::spawn_scan_loop;

use axum::Router;

use crate::state::AppState;

/// Produced by the scan loop, consumed by the reward session in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    Decoded(String),
    CameraUnavailable(String),
}

pub fn router() -> Router<AppState> {
    handlers::camera_routes()
}
