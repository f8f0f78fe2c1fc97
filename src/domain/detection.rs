use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::SnapshotRef;

/// Clase COCO 0.
pub const PERSON_LABEL: &str = "person";
pub const PERSON_CLASS_ID: usize = 0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
    pub label: String,
}

impl Detection {
    pub fn is_person(&self) -> bool {
        self.class_id == PERSON_CLASS_ID || self.label == PERSON_LABEL
    }

    pub fn bbox(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Origen de un evento: el bucle de la cámara o una imagen subida.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    Live,
    Upload,
}

/// Resultado de una inferencia con al menos una persona.
/// Solo vive hasta que el Alert Gate decide; nunca se persiste tal cual.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    pub timestamp: DateTime<Utc>,
    pub label: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
    pub snapshot: SnapshotRef,
    pub source: AlertSource,
}

impl DetectionEvent {
    /// Construye el evento a partir de la persona con mayor confianza.
    /// Devuelve `None` si no hay personas entre las detecciones.
    pub fn from_detections(
        detections: &[Detection],
        timestamp: DateTime<Utc>,
        snapshot: SnapshotRef,
        source: AlertSource,
    ) -> Option<Self> {
        let best = best_person(detections)?;
        Some(Self {
            timestamp,
            label: PERSON_LABEL.to_string(),
            confidence: best.score.clamp(0.0, 1.0),
            bbox: best.bbox(),
            snapshot,
            source,
        })
    }
}

pub fn persons(detections: Vec<Detection>) -> Vec<Detection> {
    detections.into_iter().filter(Detection::is_person).collect()
}

pub fn best_person(detections: &[Detection]) -> Option<&Detection> {
    detections
        .iter()
        .filter(|d| d.is_person())
        .max_by(|a, b| a.score.total_cmp(&b.score))
}
