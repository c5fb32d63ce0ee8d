use serde::{Deserialize, Serialize};

/// Places a decoded code in front of the camera; `null` clears the frame.
#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CameraStatusRequest {
    pub available: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CameraResponse {
    pub frame: Option<String>,
    pub available: bool,
    pub fault: Option<String>,
}
