pub mod error;
pub mod routes;
pub mod state;
pub mod stream;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, get_service, post, MethodRouter},
    Router,
};
use std::path::{Path, PathBuf};
use tower_http::services::{ServeDir, ServeFile};

use crate::adapters::http::state::HttpState;

/// Carpetas servidas tal cual.
#[derive(Debug, Clone)]
pub struct HttpPaths {
    pub static_dir: PathBuf,
    pub upload_dir: PathBuf,
}

/// Margen para las cabeceras y delimitadores del multipart.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn page(static_dir: &Path, name: &str) -> MethodRouter<HttpState> {
    get_service(ServeFile::new(static_dir.join(name)))
}

pub fn router(state: HttpState, paths: &HttpPaths) -> Router {
    let upload_limit = state.uploads.max_bytes() + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", page(&paths.static_dir, "index.html"))
        .route("/admin", page(&paths.static_dir, "admin.html").post(routes::toggle_shop))
        .route("/live", page(&paths.static_dir, "live.html"))
        .route(
            "/upload",
            page(&paths.static_dir, "upload.html")
                .post(routes::upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/video_feed", get(stream::video_feed))
        .route("/api/shop/status", get(routes::shop_status))
        .route("/api/shop/toggle", post(routes::toggle_shop))
        .route("/api/alerts/history", get(routes::alerts_history))
        .route("/api/health", get(routes::health))
        .nest_service("/uploads", ServeDir::new(&paths.upload_dir))
        .fallback_service(ServeDir::new(&paths.static_dir))
        .with_state(state)
}
