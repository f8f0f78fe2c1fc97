use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{
    AlertsHistoryResponse, HealthResponse, HistoryQuery, ShopStatusResponse, ToggleShopRequest,
    ToggleShopResponse, UploadResponse,
};

pub async fn shop_status(State(st): State<HttpState>) -> impl IntoResponse {
    Json(ShopStatusResponse::from(st.alerts.shop_mode()))
}

/// Acepta `{"is_on": bool}`; un cuerpo vacío o sin `is_on` invierte el modo.
pub async fn toggle_shop(State(st): State<HttpState>, body: Bytes) -> Response {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        ToggleShopRequest::default()
    } else {
        match serde_json::from_slice::<ToggleShopRequest>(&body) {
            Ok(r) => r,
            Err(e) => {
                error!("Error toggling shop mode: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "error": e.to_string() })),
                )
                    .into_response();
            }
        }
    };

    let mode = st.alerts.toggle_shop_mode(req.is_on).await;
    Json(ToggleShopResponse::from(mode)).into_response()
}

pub async fn alerts_history(
    State(st): State<HttpState>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = q.limit.unwrap_or_else(|| st.alerts.log_capacity());
    let (alerts, total) = st.alerts.history(limit);
    Json(AlertsHistoryResponse { alerts, total })
}

pub async fn health(State(st): State<HttpState>) -> impl IntoResponse {
    let notifier = st.alerts.notifier();
    Json(HealthResponse {
        ok: true,
        shop_mode: st.alerts.shop_mode(),
        alerts_logged: st.alerts.alerts_logged(),
        email_enabled: notifier.email_enabled(),
        whatsapp_enabled: notifier.messaging_enabled(),
    })
}

pub async fn upload(
    State(st): State<HttpState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_name = None;
    let mut bytes = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        // Campo presente sin nombre de archivo = "No file selected".
        file_name = Some(field.file_name().unwrap_or_default().to_string());
        bytes = field.bytes().await?.to_vec();
        break;
    }

    let outcome = st.uploads.process(file_name, bytes).await?;
    Ok(Json(UploadResponse::from(&outcome)))
}
