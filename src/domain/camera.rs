// src/domain/camera.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraId { pub path: String }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraMode {
    pub format: String,
    pub size: FrameSize,
    pub fps: u32,
}

/// Cámara más modo de captura solicitado al driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    pub camera: CameraId,
    pub mode: CameraMode,
}
