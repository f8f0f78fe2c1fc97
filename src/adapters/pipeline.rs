use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use crate::application::detection_loop::DetectionLoop;
use crate::application::ports::StreamPort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    stream::LiveFrame,
};

/// Hilo dedicado que ejecuta el bucle de detección sin parar y
/// publica cada frame anotado en un canal broadcast.
pub struct PipelineAdapter {
    tx: broadcast::Sender<LiveFrame>,
}

impl PipelineAdapter {
    pub fn channel() -> broadcast::Sender<LiveFrame> {
        let (tx, _) = broadcast::channel(16);
        tx
    }

    /// Debe llamarse dentro del runtime de Tokio: el hilo reutiliza su handle
    /// para guardar capturas y enviar notificaciones.
    pub fn start(
        tx: broadcast::Sender<LiveFrame>,
        mut worker: DetectionLoop,
    ) -> DomainResult<Self> {
        let tokio_handle = tokio::runtime::Handle::try_current()
            .map_err(|e| DomainError::OperationFailed(format!("sin runtime de Tokio: {e}")))?;

        std::thread::Builder::new()
            .name("detection-loop".into())
            .spawn(move || {
                info!("Pipeline Worker: Hilo de captura y detección iniciado.");
                loop {
                    tokio_handle.block_on(worker.step());
                }
            })
            .map_err(|e| DomainError::OperationFailed(format!("no se pudo lanzar el hilo: {e}")))?;

        Ok(Self { tx })
    }
}

#[async_trait]
impl StreamPort for PipelineAdapter {
    async fn subscribe(&self) -> DomainResult<broadcast::Receiver<LiveFrame>> {
        Ok(self.tx.subscribe())
    }
}
