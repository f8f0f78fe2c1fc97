use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info};

use shop_sentinel::adapters::{
    http::{router, state::HttpState, HttpPaths},
    notify::{smtp::SmtpEmailSender, twilio::TwilioWhatsApp},
    onnx::{inference::OnnxInference, model_catalog::OnnxModelCatalog},
    pipeline::PipelineAdapter,
    storage::{shop_mode_file::JsonShopModeStore, snapshot_store::FsSnapshotStore},
    v4l2::frame_source::V4l2FrameSource,
};
use shop_sentinel::application::{
    detection_loop::DetectionLoop,
    notifier::{EmailChannel, MessagingChannel, Notifier},
    ports::{EmailPort, MessagingPort, ModelCatalogPort, ShopModeStorePort, SnapshotStorePort},
    services::{AlertService, DetectionService, PipelineService},
    upload::UploadService,
};
use shop_sentinel::config::AppConfig;
use shop_sentinel::domain::{alert::AlertLog, gate::AlertGate, model::ModelId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    init_logging();

    // 2. Configuración desde el entorno (.env opcional)
    let config = AppConfig::from_env().context("configuración inválida")?;

    // 3. Sin modelo no hay detección: fallo fatal de arranque
    let model = ModelId {
        name: "yolov8n".into(),
        onnx_path: config.model_path.to_string_lossy().into_owned(),
    };
    OnnxModelCatalog::new().validate_model(&model).await?;
    let engine = Arc::new(OnnxInference::load(&model)?);

    // 4. Adaptadores de infraestructura
    let snapshots: Arc<dyn SnapshotStorePort> = Arc::new(
        FsSnapshotStore::open(&config.upload_dir)
            .await
            .context("no se pudo crear la carpeta de capturas")?,
    );
    let shop_store = config
        .shop_mode_file
        .as_ref()
        .map(|p| Arc::new(JsonShopModeStore::new(p)) as Arc<dyn ShopModeStorePort>);

    let email = config.email.as_ref().and_then(|cfg| match SmtpEmailSender::new(cfg) {
        Ok(sender) => Some(EmailChannel {
            transport: Arc::new(sender) as Arc<dyn EmailPort>,
            to: cfg.alert_to.clone(),
        }),
        Err(e) => {
            error!("Email alerts disabled: {}", e);
            None
        }
    });
    let messaging = config.whatsapp.as_ref().map(|cfg| MessagingChannel {
        transport: Arc::new(TwilioWhatsApp::new(cfg)) as Arc<dyn MessagingPort>,
        to: cfg.alert_phones.clone(),
    });

    // 5. Servicios (casos de uso)
    let alerts = Arc::new(AlertService::new(
        AlertGate::new(config.confidence_threshold, config.alert_cooldown),
        AlertLog::new(config.alert_log_capacity),
        snapshots.clone(),
        shop_store,
        Notifier::new(email, messaging),
    ));
    let initial_mode = alerts.restore_shop_mode().await;

    let detection = Arc::new(DetectionService::new(
        engine,
        config.yolo.clone(),
        config.confidence_threshold,
    ));
    let uploads = Arc::new(UploadService::new(
        detection.clone(),
        alerts.clone(),
        snapshots,
        config.max_upload_bytes,
    ));

    // 6. Bucle de cámara en su propio hilo
    let tx = PipelineAdapter::channel();
    let worker = DetectionLoop::new(
        Box::new(V4l2FrameSource::new(config.camera.clone())),
        detection,
        alerts.clone(),
        tx.clone(),
    );
    let pipeline = Arc::new(PipelineService::new(Arc::new(PipelineAdapter::start(tx, worker)?)));

    // 7. Router de Axum y archivos estáticos
    let state = HttpState { alerts, uploads, pipeline };
    let app = router(state, &HttpPaths {
        static_dir: config.static_dir.clone(),
        upload_dir: config.upload_dir.clone(),
    });

    // 8. Lanzar el servidor
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("no se pudo escuchar en {addr}"))?;

    info!(
        threshold = config.confidence_threshold,
        cooldown_secs = config.alert_cooldown.as_secs(),
        mode = initial_mode.status_text(),
        "🏪 Shop Security System Ready!"
    );
    info!("📱 Local Access: http://127.0.0.1:{}", config.port);
    info!("📹 Live Camera: http://127.0.0.1:{}/live", config.port);
    info!("📤 Upload Image: http://127.0.0.1:{}/upload", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("No se pudo instalar el manejador de Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Apagando servidor...");
}
