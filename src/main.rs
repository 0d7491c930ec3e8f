use std::sync::Arc;

use clap::Parser;
use tower_http::services::ServeDir;

use openvision_assist::adapters::{
    device::{battery::SysfsBattery, clock::IntervalClock, geolocation::FixedGeolocation},
    http::{display::BroadcastDisplay, relay::RelayHub, router, state::HttpState},
    onnx::detector::OnnxDetector,
    piper::engine::{PiperConfig, PiperSpeechEngine},
    storage::json_store::JsonSettingsStore,
    v4l2::camera::{V4l2Camera, V4l2CameraConfig},
};
use openvision_assist::application::{
    battery::BatteryService,
    classifier::Classifier,
    detection_loop::DetectionLoop,
    emergency::EmergencyService,
    haptics::HapticService,
    location::LocationService,
    results::ResultsSink,
    services::{AssistantParts, AssistantService, SettingsService},
    speech_service::SpeechService,
};
use openvision_assist::config::AppConfig;
use openvision_assist::domain::hazard::HazardPolicy;

// Un solo hilo: los servicios se coordinan sin paralelismo. La inferencia
// va al pool bloqueante y la captura a su propio hilo.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cfg = AppConfig::parse();
    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Adaptadores
    let display = Arc::new(BroadcastDisplay::new(64));
    let relay = Arc::new(RelayHub::new(64));
    let camera = Arc::new(V4l2Camera::new(V4l2CameraConfig {
        back: cfg.camera_back.clone(),
        front: cfg.camera_front.clone(),
        mode: cfg.camera_mode(),
        startup_timeout: std::time::Duration::from_secs(5),
    }));
    let detector = Arc::new(OnnxDetector::new(cfg.model.clone(), cfg.yolo_params()));
    let clock = Arc::new(IntervalClock::from_hz(cfg.refresh_hz));
    let engine = Arc::new(PiperSpeechEngine::new(PiperConfig {
        piper: cfg.piper.clone(),
        voices_dir: cfg.voices_dir.clone(),
        player: cfg.player.clone(),
    }));
    let store = Arc::new(JsonSettingsStore::new(cfg.settings_path.clone()));
    let geolocation = Arc::new(FixedGeolocation::new(cfg.position()));
    let battery_port = Arc::new(SysfsBattery::default());

    // 3. Servicios (casos de uso); los ajustes guardados se aplican en AssistantService::new
    let settings = Arc::new(SettingsService::new(store));
    let initial = settings.current();

    let speech = Arc::new(SpeechService::new(engine, initial.speech.clone(), cfg.speech_gap()));
    let haptics = Arc::new(HapticService::new(display.clone(), initial.haptic_feedback));
    let classifier = Arc::new(Classifier::new(detector, initial.detection_threshold));
    let results = Arc::new(ResultsSink::new(
        display.clone(),
        speech.clone(),
        haptics.clone(),
        HazardPolicy::default(),
    ));
    let detection = DetectionLoop::new(camera, classifier.clone(), clock, cfg.detection_interval());
    let location = Arc::new(LocationService::new(geolocation, relay.clone()));
    let emergency = Arc::new(EmergencyService::new(
        speech.clone(),
        location.clone(),
        initial.emergency_contacts.clone(),
    ));
    let battery = Arc::new(BatteryService::new(battery_port, initial.battery_alerts));
    let _battery_monitor = battery.spawn_monitor(speech.clone(), cfg.battery_poll());

    let assistant = AssistantService::new(AssistantParts {
        detection,
        classifier,
        results,
        speech,
        haptics,
        location,
        emergency,
        battery,
        settings,
        display: display.clone(),
    });

    if cfg.autostart {
        if let Err(e) = assistant.start().await {
            tracing::warn!("⚠️ Arranque automático fallido: {e}");
        }
    }

    // 4. Estado de la API y router
    let state = HttpState {
        assistant: assistant.clone(),
        display,
        relay,
    };
    let app = router(state).fallback_service(ServeDir::new(&cfg.static_dir));

    // 5. Servidor
    tracing::info!("🚀 OpenVision escuchando en http://{}", cfg.listen);
    tracing::info!("📂 Archivos estáticos servidos desde {}", cfg.static_dir.display());

    let listener = tokio::net::TcpListener::bind(cfg.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("🛑 Señal de parada recibida.");
        })
        .await?;

    assistant.stop();
    Ok(())
}
