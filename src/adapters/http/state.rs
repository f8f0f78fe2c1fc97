use std::sync::Arc;
use crate::application::{
    services::{AlertService, PipelineService},
    upload::UploadService,
};

/// Estado compartido para los manejadores HTTP de Axum.
/// Contiene los servicios (casos de uso), nunca los adaptadores.
#[derive(Clone)]
pub struct HttpState {
    /// Modo de tienda, Alert Gate e historial.
    pub alerts: Arc<AlertService>,
    /// Detección sobre imágenes subidas.
    pub uploads: Arc<UploadService>,
    /// Frames anotados del bucle de la cámara.
    pub pipeline: Arc<PipelineService>,
}
