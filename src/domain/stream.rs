use serde::{Deserialize, Serialize};
use super::detection::Detection;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMeta {
    pub width: u32,
    pub height: u32,
    pub infer_ms: f32,
    pub fps_est: f32,
    pub detections: Vec<Detection>,
    /// `true` si el frame es el marcador de "sin cámara".
    pub placeholder: bool,
}

/// Frame anotado listo para el stream MJPEG.
pub type LiveFrame = (FrameMeta, Vec<u8>);
