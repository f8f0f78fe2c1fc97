use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::warn;

use crate::application::{
    annotate::{annotate, encode_jpeg, placeholder_frame},
    ports::FrameSourcePort,
    services::{AlertOutcome, AlertService, DetectionService, FrameAnalysis},
};
use crate::domain::{
    detection::{AlertSource, DetectionEvent},
    snapshot::SnapshotRef,
    stream::{FrameMeta, LiveFrame},
};

const PLACEHOLDER_SIZE: (u32, u32) = (640, 480);
const PLACEHOLDER_PACE: Duration = Duration::from_millis(33);

/// Lo que produjo una vuelta del bucle.
#[derive(Debug)]
pub struct StepReport {
    pub meta: FrameMeta,
    pub alert: Option<AlertOutcome>,
}

/// Captura → inferencia → Alert Gate → publicación del frame anotado.
pub struct DetectionLoop {
    source: Box<dyn FrameSourcePort>,
    detection: Arc<DetectionService>,
    alerts: Arc<AlertService>,
    tx: broadcast::Sender<LiveFrame>,
    fps_est: f32,
    last_t: Instant,
}

impl DetectionLoop {
    pub fn new(
        source: Box<dyn FrameSourcePort>,
        detection: Arc<DetectionService>,
        alerts: Arc<AlertService>,
        tx: broadcast::Sender<LiveFrame>,
    ) -> Self {
        Self { source, detection, alerts, tx, fps_est: 0.0, last_t: Instant::now() }
    }

    pub async fn step(&mut self) -> StepReport {
        let (mut frame, placeholder) = match self.source.capture_frame() {
            Ok(rgb) => (rgb, false),
            Err(e) => {
                warn!("Error capturando frame: {}", e);
                tokio::time::sleep(PLACEHOLDER_PACE).await;
                (placeholder_frame(PLACEHOLDER_SIZE.0, PLACEHOLDER_SIZE.1), true)
            }
        };

        let t_infer_start = Instant::now();
        let analysis = if placeholder {
            FrameAnalysis::default()
        } else {
            self.detection.analyze(&frame).unwrap_or_else(|e| {
                warn!("Inferencia fallida: {}", e);
                FrameAnalysis::default()
            })
        };
        let infer_ms = t_infer_start.elapsed().as_secs_f32() * 1000.0;

        annotate(&mut frame, &analysis.persons, self.alerts.shop_mode());
        let jpeg = match encode_jpeg(&frame) {
            Ok(j) => j,
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        };

        let alert = match DetectionEvent::from_detections(
            &analysis.persons,
            Utc::now(),
            SnapshotRef::Pending(jpeg.clone()),
            AlertSource::Live,
        ) {
            Some(event) if !jpeg.is_empty() => Some(self.alerts.handle_detection(event).await),
            _ => None,
        };

        // Cálculo de FPS para la interfaz
        let dt = self.last_t.elapsed().as_secs_f32().max(0.001);
        self.last_t = Instant::now();
        self.fps_est = 0.9 * self.fps_est + 0.1 * (1.0 / dt);

        let meta = FrameMeta {
            width: frame.width(),
            height: frame.height(),
            infer_ms,
            fps_est: self.fps_est,
            detections: analysis.persons,
            placeholder,
        };

        if self.tx.receiver_count() > 0 && !jpeg.is_empty() {
            let _ = self.tx.send((meta.clone(), jpeg));
        }

        StepReport { meta, alert }
    }
}
