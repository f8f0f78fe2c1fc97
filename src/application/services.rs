use image::RgbImage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    application::{
        notifier::Notifier,
        ports::{InferencePort, ShopModeStorePort, SnapshotStorePort, StreamPort},
    },
    domain::{
        alert::{AlertLog, AlertRecord, DeliveryReport},
        detection::{persons, Detection, DetectionEvent},
        errors::DomainResult,
        gate::{AlertGate, GateDecision, SuppressReason},
        model::YoloParams,
        shop::{ShopMode, ShopModeFlag},
        snapshot::{alert_snapshot_name, SnapshotRef},
        stream::LiveFrame,
    },
};

/// Resultado de pasar un evento por el Alert Gate.
#[derive(Debug)]
pub enum AlertOutcome {
    Suppressed(SuppressReason),
    Fired {
        record: AlertRecord,
        /// Envío en segundo plano; el registro ya está en el historial.
        delivery: JoinHandle<DeliveryReport>,
    },
}

impl AlertOutcome {
    pub fn fired(&self) -> bool {
        matches!(self, AlertOutcome::Fired { .. })
    }

    pub fn summary(&self) -> String {
        match self {
            AlertOutcome::Fired { .. } => "fired".to_string(),
            AlertOutcome::Suppressed(reason) => format!("suppressed: {reason}"),
        }
    }
}

struct AlertState {
    gate: AlertGate,
    log: AlertLog,
}

/// Dueño del estado compartido: modo de tienda, Alert Gate e historial.
/// Lo usan a la vez el bucle de detección y los manejadores HTTP.
pub struct AlertService {
    shop: ShopModeFlag,
    /// Serializa cambio y guardado del modo: memoria y archivo nunca divergen.
    mode_changes: tokio::sync::Mutex<()>,
    state: Mutex<AlertState>,
    snapshots: Arc<dyn SnapshotStorePort>,
    shop_store: Option<Arc<dyn ShopModeStorePort>>,
    notifier: Notifier,
}

impl AlertService {
    pub fn new(
        gate: AlertGate,
        log: AlertLog,
        snapshots: Arc<dyn SnapshotStorePort>,
        shop_store: Option<Arc<dyn ShopModeStorePort>>,
        notifier: Notifier,
    ) -> Self {
        Self {
            shop: ShopModeFlag::default(),
            mode_changes: tokio::sync::Mutex::new(()),
            state: Mutex::new(AlertState { gate, log }),
            snapshots,
            shop_store,
            notifier,
        }
    }

    fn state(&self) -> MutexGuard<'_, AlertState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Carga el último modo guardado; si no hay o falla, la tienda arranca abierta.
    pub async fn restore_shop_mode(&self) -> ShopMode {
        let Some(store) = &self.shop_store else { return self.shop.mode() };
        match store.load().await {
            Ok(Some(mode)) => {
                self.shop.set_mode(mode);
                info!("🏪 Shop mode restored: {}", mode.status_text());
            }
            Ok(None) => {}
            Err(e) => warn!("Could not read saved shop mode, starting OPEN: {}", e),
        }
        self.shop.mode()
    }

    pub fn shop_mode(&self) -> ShopMode {
        self.shop.mode()
    }

    /// Sobrescribe el modo. No toca el enfriamiento del gate.
    pub async fn set_shop_mode(&self, mode: ShopMode) -> ShopMode {
        let _guard = self.mode_changes.lock().await;
        self.apply_shop_mode(mode).await
    }

    /// `None` invierte el modo actual.
    pub async fn toggle_shop_mode(&self, is_on: Option<bool>) -> ShopMode {
        let _guard = self.mode_changes.lock().await;
        let next = match is_on {
            Some(on) => ShopMode::from_is_on(on),
            None => self.shop.mode().toggled(),
        };
        self.apply_shop_mode(next).await
    }

    async fn apply_shop_mode(&self, mode: ShopMode) -> ShopMode {
        self.shop.set_mode(mode);
        match mode {
            ShopMode::Closed => info!("🔒 Shop CLOSED - Security System ACTIVATED"),
            ShopMode::Open => info!("🔓 Shop OPEN - Security System DISABLED"),
        }
        if let Some(store) = &self.shop_store {
            if let Err(e) = store.save(mode).await {
                error!("Failed to persist shop mode: {}", e);
            }
        }
        mode
    }

    pub fn log_capacity(&self) -> usize {
        self.state().log.capacity()
    }

    /// Historial del más nuevo al más antiguo, más el total desde el arranque.
    pub fn history(&self, limit: usize) -> (Vec<AlertRecord>, u64) {
        let state = self.state();
        (state.log.list(limit), state.log.total())
    }

    pub fn alerts_logged(&self) -> usize {
        self.state().log.len()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn handle_detection(&self, event: DetectionEvent) -> AlertOutcome {
        let mode = self.shop.mode();
        let decision = self.state().gate.evaluate(mode, event.confidence, event.timestamp);

        if let GateDecision::Suppress(reason) = decision {
            debug!(
                source = ?event.source,
                confidence = event.confidence,
                "alert suppressed: {}",
                reason
            );
            return AlertOutcome::Suppressed(reason);
        }

        let stored = match event.snapshot {
            SnapshotRef::Stored(s) => Some(s),
            SnapshotRef::Pending(jpeg) => {
                let name = alert_snapshot_name(event.timestamp);
                match self.snapshots.write(&name, &jpeg).await {
                    Ok(s) => Some(s),
                    Err(e) => {
                        error!("Failed to save alert snapshot {}: {}", name, e);
                        None
                    }
                }
            }
        };

        let record = AlertRecord {
            timestamp: event.timestamp,
            confidence: event.confidence,
            image: stored.as_ref().map(|s| s.public_url.clone()),
            source: event.source,
        };
        self.state().log.append(record.clone());
        info!(
            source = ?record.source,
            confidence = record.confidence,
            image = record.image.as_deref().unwrap_or("-"),
            "🚨 Person detected while shop closed, alert fired"
        );

        let notifier = self.notifier.clone();
        let to_send = record.clone();
        let attachment = stored.map(|s| s.file_path);
        let delivery = tokio::spawn(async move { notifier.dispatch(&to_send, attachment).await });

        AlertOutcome::Fired { record, delivery }
    }
}

/// Personas encontradas en una imagen.
#[derive(Debug, Clone, Default)]
pub struct FrameAnalysis {
    pub persons: Vec<Detection>,
    /// Confianza de la mejor persona, 0 si no hay.
    pub confidence: f32,
    /// `confidence >= CONFIDENCE_THRESHOLD`.
    pub person_detected: bool,
}

/// Ejecuta el modelo y se queda solo con la clase `person`.
pub struct DetectionService {
    engine: Arc<dyn InferencePort>,
    params: YoloParams,
    threshold: f32,
}

impl DetectionService {
    pub fn new(engine: Arc<dyn InferencePort>, params: YoloParams, threshold: f32) -> Self {
        Self { engine, params, threshold }
    }

    pub fn analyze(&self, image: &RgbImage) -> DomainResult<FrameAnalysis> {
        let detections = self.engine.infer(image, &self.params)?;
        let persons = persons(detections);
        let confidence = persons.iter().map(|d| d.score).fold(0.0_f32, f32::max);
        Ok(FrameAnalysis {
            person_detected: !persons.is_empty() && confidence >= self.threshold,
            persons,
            confidence,
        })
    }
}

/// Acceso de los visores al stream de frames anotados.
#[derive(Clone)]
pub struct PipelineService {
    stream: Arc<dyn StreamPort>,
}

impl PipelineService {
    pub fn new(stream: Arc<dyn StreamPort>) -> Self {
        Self { stream }
    }

    /// Receptor del canal broadcast donde se publican los frames y sus metadatos.
    pub async fn subscribe(&self) -> DomainResult<broadcast::Receiver<LiveFrame>> {
        self.stream.subscribe().await
    }
}
