use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::application::{services::AlertOutcome, upload::UploadOutcome};
use crate::domain::{alert::AlertRecord, detection::Detection, shop::ShopMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopStatusResponse {
    pub is_on: bool,
    pub status: String,
    pub timestamp: DateTime<Local>,
}

impl From<ShopMode> for ShopStatusResponse {
    fn from(mode: ShopMode) -> Self {
        Self {
            is_on: mode.is_on(),
            status: mode.status_text().to_string(),
            timestamp: Local::now(),
        }
    }
}

/// Cuerpo de `/api/shop/toggle`; sin `is_on` se invierte el modo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToggleShopRequest {
    pub is_on: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleShopResponse {
    pub success: bool,
    pub is_on: bool,
    pub message: String,
}

impl From<ShopMode> for ToggleShopResponse {
    fn from(mode: ShopMode) -> Self {
        let message = match mode {
            ShopMode::Closed => "🔒 Shop CLOSED - Security System ACTIVATED",
            ShopMode::Open => "🔓 Shop OPEN - Security System DISABLED",
        };
        Self { success: true, is_on: mode.is_on(), message: message.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsHistoryResponse {
    pub alerts: Vec<AlertRecord>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDto {
    pub class: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

impl From<&Detection> for DetectionDto {
    fn from(d: &Detection) -> Self {
        Self { class: d.label.clone(), confidence: d.score, bbox: d.bbox() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub person_detected: bool,
    pub confidence: f32,
    pub message: String,
    pub annotated_image: String,
    pub original_image: String,
    pub detections: Vec<DetectionDto>,
    pub alert: String,
}

impl From<&UploadOutcome> for UploadResponse {
    fn from(o: &UploadOutcome) -> Self {
        let message = if o.analysis.person_detected {
            "PERSON DETECTED"
        } else {
            "NO PERSON DETECTED"
        };
        Self {
            person_detected: o.analysis.person_detected,
            confidence: o.analysis.confidence,
            message: message.to_string(),
            annotated_image: o.annotated.public_url.clone(),
            original_image: o.original.public_url.clone(),
            detections: o.analysis.persons.iter().map(DetectionDto::from).collect(),
            alert: o
                .alert
                .as_ref()
                .map(AlertOutcome::summary)
                .unwrap_or_else(|| "none".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub shop_mode: ShopMode,
    pub alerts_logged: usize,
    pub email_enabled: bool,
    pub whatsapp_enabled: bool,
}
