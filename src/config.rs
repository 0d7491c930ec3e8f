use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::domain::{
    camera::{CameraMode, FrameSize},
    model::YoloParams,
    relay::GeoPosition,
};

/// Configuración de arranque. Cada opción admite también su variable `OPENVISION_*`.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Asistente de percepción con alertas habladas y hápticas")]
pub struct AppConfig {
    /// Dirección del panel web y de los WebSockets.
    #[arg(long, env = "OPENVISION_LISTEN", default_value = "0.0.0.0:8090")]
    pub listen: SocketAddr,

    /// Carpeta de archivos estáticos del panel.
    #[arg(long, env = "OPENVISION_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    #[arg(long, env = "OPENVISION_SETTINGS", default_value = "openvision-settings.json")]
    pub settings_path: PathBuf,

    /// Modelo YOLO exportado a ONNX.
    #[arg(long, env = "OPENVISION_MODEL", default_value = "models/yolo11n.onnx")]
    pub model: PathBuf,

    #[arg(long, env = "OPENVISION_MODEL_INPUT", default_value_t = 640)]
    pub model_input_size: u32,

    #[arg(long, env = "OPENVISION_IOU", default_value_t = 0.45)]
    pub iou_threshold: f32,

    #[arg(long, env = "OPENVISION_MAX_DETECTIONS", default_value_t = 100)]
    pub max_detections: usize,

    /// Cámara trasera (la de uso normal).
    #[arg(long, env = "OPENVISION_CAMERA_BACK", default_value = "/dev/video0")]
    pub camera_back: String,

    /// Cámara frontal; sin ella no se puede cambiar de cámara.
    #[arg(long, env = "OPENVISION_CAMERA_FRONT")]
    pub camera_front: Option<String>,

    #[arg(long, env = "OPENVISION_FOURCC", default_value = "MJPG")]
    pub fourcc: String,

    #[arg(long, env = "OPENVISION_WIDTH", default_value_t = 1280)]
    pub width: u32,

    #[arg(long, env = "OPENVISION_HEIGHT", default_value_t = 720)]
    pub height: u32,

    #[arg(long, env = "OPENVISION_FPS", default_value_t = 30)]
    pub fps: u32,

    #[arg(long, env = "OPENVISION_PIPER", default_value = "./piper_voice/piper/piper")]
    pub piper: PathBuf,

    /// Carpeta con los modelos de voz `*.onnx` de Piper.
    #[arg(long, env = "OPENVISION_VOICES", default_value = "./piper_voice")]
    pub voices_dir: PathBuf,

    #[arg(long, env = "OPENVISION_PLAYER", default_value = "aplay")]
    pub player: String,

    /// Intervalo mínimo entre clasificaciones.
    #[arg(long, env = "OPENVISION_DETECTION_INTERVAL_MS", default_value_t = 500)]
    pub detection_interval_ms: u64,

    /// Intervalo mínimo entre locuciones no prioritarias.
    #[arg(long, env = "OPENVISION_SPEECH_GAP_MS", default_value_t = 2000)]
    pub speech_gap_ms: u64,

    #[arg(long, env = "OPENVISION_REFRESH_HZ", default_value_t = 60)]
    pub refresh_hz: u32,

    #[arg(long, env = "OPENVISION_BATTERY_POLL_SECS", default_value_t = 60)]
    pub battery_poll_secs: u64,

    /// Posición fija del dispositivo.
    #[arg(long, env = "OPENVISION_LATITUDE", requires = "longitude", allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long, env = "OPENVISION_LONGITUDE", requires = "latitude", allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Arranca la detección sin esperar a `/api/start`.
    #[arg(long, env = "OPENVISION_AUTOSTART")]
    pub autostart: bool,
}

impl AppConfig {
    pub fn camera_mode(&self) -> CameraMode {
        CameraMode {
            format: self.fourcc.clone(),
            size: FrameSize::new(self.width, self.height),
            fps: self.fps,
        }
    }

    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.model_input_size,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
            ..YoloParams::default()
        }
    }

    pub fn position(&self) -> Option<GeoPosition> {
        Some(GeoPosition::new(self.latitude?, self.longitude?))
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }

    pub fn speech_gap(&self) -> Duration {
        Duration::from_millis(self.speech_gap_ms)
    }

    pub fn battery_poll(&self) -> Duration {
        Duration::from_secs(self.battery_poll_secs.max(1))
    }
}
