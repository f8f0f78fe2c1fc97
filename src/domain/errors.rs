use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Archivo demasiado grande: {0}")]
    PayloadTooLarge(String),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
    #[error("Error de captura: {0}")]
    Capture(String),
    #[error("Error de inferencia: {0}")]
    Inference(String),
    #[error("Error de transporte: {0}")]
    Transport(String),
    #[error("Error de almacenamiento: {0}")]
    Storage(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
