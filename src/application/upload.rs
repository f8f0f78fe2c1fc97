use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::application::{
    annotate::{annotate, encode_for_extension},
    ports::SnapshotStorePort,
    services::{AlertOutcome, AlertService, DetectionService, FrameAnalysis},
};
use crate::domain::{
    detection::{AlertSource, DetectionEvent},
    errors::{DomainError, DomainResult},
    snapshot::{allowed_extension, annotated_name, upload_name, SnapshotRef, StoredSnapshot},
};

#[derive(Debug)]
pub struct UploadOutcome {
    pub analysis: FrameAnalysis,
    pub original: StoredSnapshot,
    pub annotated: StoredSnapshot,
    /// `None` cuando no apareció ninguna persona.
    pub alert: Option<AlertOutcome>,
}

/// Prueba de detección sobre una sola imagen subida.
pub struct UploadService {
    detection: Arc<DetectionService>,
    alerts: Arc<AlertService>,
    store: Arc<dyn SnapshotStorePort>,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(
        detection: Arc<DetectionService>,
        alerts: Arc<AlertService>,
        store: Arc<dyn SnapshotStorePort>,
        max_bytes: usize,
    ) -> Self {
        Self { detection, alerts, store, max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Valida antes de tocar el disco; un rechazo no deja rastro.
    pub async fn process(
        &self,
        file_name: Option<String>,
        bytes: Vec<u8>,
    ) -> DomainResult<UploadOutcome> {
        let Some(file_name) = file_name else {
            return Err(DomainError::InvalidInput("No file provided".into()));
        };
        if file_name.trim().is_empty() {
            return Err(DomainError::InvalidInput("No file selected".into()));
        }
        let Some(ext) = allowed_extension(&file_name) else {
            return Err(DomainError::InvalidInput("File type not allowed. Use JPG or PNG.".into()));
        };
        if bytes.len() > self.max_bytes {
            return Err(DomainError::PayloadTooLarge(format!(
                "File too large. Max size: {:.0}MB",
                self.max_bytes as f64 / (1024.0 * 1024.0)
            )));
        }

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| DomainError::InvalidInput(format!("Invalid image: {e}")))?;

        let received_at = Utc::now();
        let stored_name = upload_name(received_at, &file_name);
        let original = self.store.write(&stored_name, &bytes).await?;

        let detection = self.detection.clone();
        let mode = self.alerts.shop_mode();
        let work = move || -> DomainResult<(FrameAnalysis, Vec<u8>)> {
            let mut rgb = decoded.to_rgb8();
            let analysis = detection.analyze(&rgb)?;
            annotate(&mut rgb, &analysis.persons, mode);
            let encoded = encode_for_extension(&rgb, &ext)?;
            Ok((analysis, encoded))
        };
        let (analysis, encoded) = tokio::task::spawn_blocking(work)
            .await
            .map_err(|e| DomainError::OperationFailed(format!("inference task: {e}")))??;

        let annotated = self.store.write(&annotated_name(&stored_name), &encoded).await?;
        info!(
            file = %stored_name,
            persons = analysis.persons.len(),
            confidence = analysis.confidence,
            "📤 Upload analysed"
        );

        let alert = match DetectionEvent::from_detections(
            &analysis.persons,
            received_at,
            SnapshotRef::Stored(annotated.clone()),
            AlertSource::Upload,
        ) {
            Some(event) => Some(self.alerts.handle_detection(event).await),
            None => None,
        };

        Ok(UploadOutcome { analysis, original, annotated, alert })
    }
}
