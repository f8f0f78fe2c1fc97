#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use image::{ImageFormat, RgbImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use shop_sentinel::application::{
    notifier::{EmailChannel, MessagingChannel, Notifier},
    ports::{
        EmailPort, FrameSourcePort, InferencePort, MessagingPort, ShopModeStorePort,
        SnapshotStorePort, StreamPort,
    },
    services::AlertService,
};
use shop_sentinel::domain::{
    alert::AlertLog,
    detection::{AlertSource, Detection, DetectionEvent},
    errors::{DomainError, DomainResult},
    gate::AlertGate,
    model::YoloParams,
    shop::ShopMode,
    snapshot::{SnapshotRef, StoredSnapshot},
    stream::LiveFrame,
};

pub const THRESHOLD: f32 = 0.2;
pub const COOLDOWN: Duration = Duration::from_secs(120);

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn person(score: f32) -> Detection {
    Detection { x1: 4.0, y1: 4.0, x2: 20.0, y2: 28.0, score, class_id: 0, label: "person".into() }
}

pub fn live_event(secs: i64, confidence: f32) -> DetectionEvent {
    DetectionEvent::from_detections(
        &[person(confidence)],
        at(secs),
        SnapshotRef::Pending(vec![0xFF, 0xD8, 0xFF, 0xD9]),
        AlertSource::Live,
    )
    .unwrap()
}

pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(RgbImage::new(w, h))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Devuelve siempre las mismas detecciones.
#[derive(Default)]
pub struct FakeInference {
    pub detections: Mutex<Vec<Detection>>,
    pub calls: Mutex<usize>,
}

impl FakeInference {
    pub fn returning(detections: Vec<Detection>) -> Arc<Self> {
        Arc::new(Self { detections: Mutex::new(detections), calls: Mutex::new(0) })
    }
}

impl InferencePort for FakeInference {
    fn infer(&self, _image: &RgbImage, _params: &YoloParams) -> DomainResult<Vec<Detection>> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.detections.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    pub writes: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail: bool,
}

impl MemorySnapshotStore {
    pub fn failing() -> Self {
        Self { writes: Mutex::default(), fail: true }
    }

    pub fn names(&self) -> Vec<String> {
        self.writes.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }
}

#[async_trait]
impl SnapshotStorePort for MemorySnapshotStore {
    async fn write(&self, file_name: &str, bytes: &[u8]) -> DomainResult<StoredSnapshot> {
        if self.fail {
            return Err(DomainError::Storage("disk full".into()));
        }
        self.writes.lock().unwrap().push((file_name.to_string(), bytes.to_vec()));
        Ok(StoredSnapshot {
            public_url: format!("/uploads/{file_name}"),
            file_path: PathBuf::from("/nonexistent").join(file_name),
        })
    }
}

#[derive(Default)]
pub struct MemoryShopModeStore {
    pub saved: Mutex<Option<ShopMode>>,
}

#[async_trait]
impl ShopModeStorePort for MemoryShopModeStore {
    async fn load(&self) -> DomainResult<Option<ShopMode>> {
        Ok(*self.saved.lock().unwrap())
    }

    async fn save(&self, mode: ShopMode) -> DomainResult<()> {
        // Cede el turno como haría una escritura real a disco.
        tokio::task::yield_now().await;
        *self.saved.lock().unwrap() = Some(mode);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<(String, String, Option<PathBuf>)>>,
    pub fail: bool,
}

#[async_trait]
impl EmailPort for RecordingEmail {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        _body: &str,
        attachment: Option<&Path>,
    ) -> DomainResult<()> {
        if self.fail {
            return Err(DomainError::Transport("SMTP: connection refused".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), attachment.map(Path::to_path_buf)));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMessaging {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MessagingPort for RecordingMessaging {
    async fn send_message(&self, to: &str, text: &str) -> DomainResult<()> {
        self.sent.lock().unwrap().push((to.to_string(), text.to_string()));
        Ok(())
    }
}

/// Entrega frames (o errores) en orden y luego falla siempre.
pub struct ScriptedFrames {
    pub frames: VecDeque<DomainResult<RgbImage>>,
}

impl FrameSourcePort for ScriptedFrames {
    fn capture_frame(&mut self) -> DomainResult<RgbImage> {
        self.frames
            .pop_front()
            .unwrap_or_else(|| Err(DomainError::Capture("no more frames".into())))
    }
}

pub struct ChannelStream {
    pub tx: broadcast::Sender<LiveFrame>,
}

#[async_trait]
impl StreamPort for ChannelStream {
    async fn subscribe(&self) -> DomainResult<broadcast::Receiver<LiveFrame>> {
        Ok(self.tx.subscribe())
    }
}

pub struct Harness {
    pub alerts: Arc<AlertService>,
    pub store: Arc<MemorySnapshotStore>,
    pub email: Arc<RecordingEmail>,
    pub messaging: Arc<RecordingMessaging>,
}

pub fn harness_with(store: MemorySnapshotStore, email: RecordingEmail, capacity: usize) -> Harness {
    let store = Arc::new(store);
    let email = Arc::new(email);
    let messaging = Arc::new(RecordingMessaging::default());
    let notifier = Notifier::new(
        Some(EmailChannel { transport: email.clone(), to: "owner@example.com".into() }),
        Some(MessagingChannel { transport: messaging.clone(), to: vec!["+34600000001".into()] }),
    );
    let alerts = Arc::new(AlertService::new(
        AlertGate::new(THRESHOLD, COOLDOWN),
        AlertLog::new(capacity),
        store.clone(),
        None,
        notifier,
    ));
    Harness { alerts, store, email, messaging }
}

pub fn harness() -> Harness {
    harness_with(MemorySnapshotStore::default(), RecordingEmail::default(), 20)
}
