use image::RgbImage;
use std::time::{Duration, Instant};
use tracing::{error, warn};

use crate::adapters::v4l2::capture::V4l2Capture;
use crate::application::ports::FrameSourcePort;
use crate::domain::{
    camera::CameraSettings,
    errors::{DomainError, DomainResult},
};

const REOPEN_INTERVAL: Duration = Duration::from_secs(5);

/// Abre la cámara bajo demanda y la reintenta como mucho cada 5 s.
pub struct V4l2FrameSource {
    settings: CameraSettings,
    capture: Option<V4l2Capture>,
    last_attempt: Option<Instant>,
}

impl V4l2FrameSource {
    pub fn new(settings: CameraSettings) -> Self {
        Self { settings, capture: None, last_attempt: None }
    }

    fn ensure_open(&mut self) -> DomainResult<&mut V4l2Capture> {
        if self.capture.is_none() {
            let due = self.last_attempt.map_or(true, |t| t.elapsed() >= REOPEN_INTERVAL);
            if !due {
                let path = &self.settings.camera.path;
                return Err(DomainError::Capture(format!("{path} no disponible")));
            }
            self.last_attempt = Some(Instant::now());
            match V4l2Capture::open(&self.settings) {
                Ok(cap) => self.capture = Some(cap),
                Err(e) => {
                    warn!(
                        "Could not open webcam {}: {:#}. Using placeholder image.",
                        self.settings.camera.path, e
                    );
                    return Err(DomainError::Capture(format!("{e:#}")));
                }
            }
        }
        self.capture
            .as_mut()
            .ok_or_else(|| DomainError::Capture("cámara cerrada".into()))
    }
}

impl FrameSourcePort for V4l2FrameSource {
    fn capture_frame(&mut self) -> DomainResult<RgbImage> {
        let cap = self.ensure_open()?;
        match cap.next_rgb() {
            Ok(rgb) => Ok(rgb),
            Err(e) => {
                error!("Error capturando frame, se reabrirá la cámara: {:#}", e);
                self.capture = None;
                Err(DomainError::Capture(format!("{e:#}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::camera::{CameraId, CameraMode, FrameSize};

    fn missing_camera() -> V4l2FrameSource {
        V4l2FrameSource::new(CameraSettings {
            camera: CameraId { path: "/nonexistent/video99".into() },
            mode: CameraMode {
                format: "MJPG".into(),
                size: FrameSize { width: 640, height: 480 },
                fps: 30,
            },
        })
    }

    fn capture_message(src: &mut V4l2FrameSource) -> String {
        match src.capture_frame() {
            Err(DomainError::Capture(m)) => m,
            other => panic!("expected capture error, got {other:?}"),
        }
    }

    #[test]
    fn reopen_waits_for_backoff() {
        let mut src = missing_camera();

        let first = capture_message(&mut src);
        assert!(!first.contains("no disponible"));
        assert!(src.capture.is_none());
        let attempted_at = src.last_attempt.unwrap();

        // Dentro del intervalo no se vuelve a tocar el dispositivo.
        assert!(capture_message(&mut src).contains("no disponible"));
        assert_eq!(src.last_attempt, Some(attempted_at));

        // Pasado el intervalo se reintenta la apertura.
        src.last_attempt = attempted_at.checked_sub(REOPEN_INTERVAL);
        let retried = capture_message(&mut src);
        assert!(!retried.contains("no disponible"));
        assert!(src.last_attempt.unwrap() >= attempted_at);
    }
}
