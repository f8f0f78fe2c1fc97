use async_trait::async_trait;
use image::RgbImage;
use std::path::Path;
use tokio::sync::broadcast;

use crate::domain::{
    detection::Detection,
    errors::DomainResult,
    model::{ModelId, YoloParams},
    shop::ShopMode,
    snapshot::StoredSnapshot,
    stream::LiveFrame,
};

/// Modelo preentrenado opaco: imagen de entrada, detecciones de salida.
/// Es bloqueante; los llamadores async deben usar `spawn_blocking`.
pub trait InferencePort: Send + Sync {
    fn infer(&self, image: &RgbImage, params: &YoloParams) -> DomainResult<Vec<Detection>>;
}

/// Fuente de frames para el bucle de detección. Vive en su propio hilo.
pub trait FrameSourcePort: Send {
    fn capture_frame(&mut self) -> DomainResult<RgbImage>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}

#[async_trait]
pub trait SnapshotStorePort: Send + Sync {
    /// Escribe `bytes` como `file_name` en la carpeta plana de capturas.
    async fn write(&self, file_name: &str, bytes: &[u8]) -> DomainResult<StoredSnapshot>;
}

#[async_trait]
pub trait ShopModeStorePort: Send + Sync {
    async fn load(&self) -> DomainResult<Option<ShopMode>>;
    async fn save(&self, mode: ShopMode) -> DomainResult<()>;
}

#[async_trait]
pub trait EmailPort: Send + Sync {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> DomainResult<()>;
}

#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_message(&self, to: &str, text: &str) -> DomainResult<()>;
}

#[async_trait]
pub trait StreamPort: Send + Sync {
    async fn subscribe(&self) -> DomainResult<broadcast::Receiver<LiveFrame>>;
}
