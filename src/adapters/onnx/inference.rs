use image::RgbImage;
use std::sync::{Mutex, PoisonError};

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::InferencePort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::{ModelId, YoloParams},
};

/// Comparte una sesión ORT entre el bucle de la cámara y las subidas.
pub struct OnnxInference {
    engine: Mutex<OnnxYoloEngine>,
}

impl OnnxInference {
    pub fn load(model: &ModelId) -> DomainResult<Self> {
        let engine = OnnxYoloEngine::load(&model.onnx_path)
            .map_err(|e| DomainError::Inference(format!("cargando {}: {e:#}", model.onnx_path)))?;
        tracing::info!("🧠 Modelo {} cargado desde {}", model.name, model.onnx_path);
        Ok(Self { engine: Mutex::new(engine) })
    }
}

impl InferencePort for OnnxInference {
    fn infer(&self, image: &RgbImage, params: &YoloParams) -> DomainResult<Vec<Detection>> {
        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        engine.infer(image, params).map_err(|e| DomainError::Inference(format!("{e:#}")))
    }
}
