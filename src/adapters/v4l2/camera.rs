use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};
use tracing::{error, info, warn};
use v4l::Device;

use crate::adapters::v4l2::capture::V4l2Capture;
use crate::application::ports::CameraPort;
use crate::domain::camera::{CameraFacing, CameraMode, Frame};

/// Errores seguidos de captura tras los que se da el stream por perdido.
const MAX_CAPTURE_ERRORS: u32 = 10;

pub struct V4l2CameraConfig {
    pub back: String,
    pub front: Option<String>,
    pub mode: CameraMode,
    /// Tiempo máximo hasta el primer frame.
    pub startup_timeout: Duration,
}

struct CaptureSession {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Cámara V4L2: un hilo de captura por sesión publica el último frame en un
/// canal `watch` del que lee el bucle de detección.
pub struct V4l2Camera {
    config: V4l2CameraConfig,
    frames: watch::Sender<Option<Arc<Frame>>>,
    session: Mutex<Option<CaptureSession>>,
    retired: Mutex<Vec<JoinHandle<()>>>,
}

impl V4l2Camera {
    pub fn new(config: V4l2CameraConfig) -> Self {
        let (frames, _) = watch::channel(None);
        Self {
            config,
            frames,
            session: Mutex::new(None),
            retired: Mutex::new(Vec::new()),
        }
    }

    fn device_path(&self, facing: CameraFacing) -> Option<&str> {
        match facing {
            CameraFacing::Back => Some(self.config.back.as_str()),
            CameraFacing::Front => self.config.front.as_deref(),
        }
    }

    /// Espera a que terminen los hilos de sesiones anteriores para no abrir
    /// el mismo dispositivo dos veces.
    async fn join_retired(&self) {
        let retired: Vec<_> = std::mem::take(&mut *self.retired.lock().unwrap_or_else(PoisonError::into_inner));
        if retired.is_empty() {
            return;
        }
        let joined = tokio::task::spawn_blocking(move || {
            for handle in retired {
                if handle.join().is_err() {
                    warn!("⚠️ El hilo de captura anterior terminó con pánico.");
                }
            }
        })
        .await;
        if let Err(e) = joined {
            warn!("⚠️ No se pudo esperar al hilo de captura: {e}");
        }
    }
}

fn capture_thread(
    path: String,
    mode: CameraMode,
    frames: watch::Sender<Option<Arc<Frame>>>,
    stop: Arc<AtomicBool>,
    ready: oneshot::Sender<bool>,
) {
    let dev = match Device::with_path(&path) {
        Ok(d) => d,
        Err(e) => {
            error!("❌ No se pudo abrir {path}: {e}");
            let _ = ready.send(false);
            return;
        }
    };
    let mut capture = match V4l2Capture::open(&dev, &mode) {
        Ok(c) => c,
        Err(e) => {
            error!("❌ No se pudo configurar {path}: {e}");
            let _ = ready.send(false);
            return;
        }
    };

    let mut ready = Some(ready);
    let mut failures = 0;
    while !stop.load(Ordering::Acquire) {
        match capture.next_rgb() {
            Ok(rgb) => {
                failures = 0;
                if stop.load(Ordering::Acquire) {
                    break;
                }
                frames.send_replace(Some(Arc::new(Frame::new(rgb))));
                if let Some(tx) = ready.take() {
                    let _ = tx.send(true);
                }
            }
            Err(e) => {
                failures += 1;
                warn!("⚠️ Error de captura en {path} ({failures}/{MAX_CAPTURE_ERRORS}): {e}");
                if failures >= MAX_CAPTURE_ERRORS {
                    error!("❌ Stream de {path} perdido.");
                    break;
                }
            }
        }
    }
    if let Some(tx) = ready.take() {
        let _ = tx.send(false);
    }
    info!("📷 Hilo de captura de {path} terminado.");
}

#[async_trait]
impl CameraPort for V4l2Camera {
    async fn acquire(&self, facing: CameraFacing) -> bool {
        self.release();
        self.join_retired().await;

        let Some(path) = self.device_path(facing).map(str::to_owned) else {
            warn!("⚠️ No hay cámara configurada para {:?}", facing);
            return false;
        };

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = {
            let (path, mode, frames, stop) = (path.clone(), self.config.mode.clone(), self.frames.clone(), Arc::clone(&stop));
            std::thread::Builder::new()
                .name("v4l2-capture".into())
                .spawn(move || capture_thread(path, mode, frames, stop, ready_tx))
        };
        let handle = match handle {
            Ok(h) => h,
            Err(e) => {
                error!("❌ No se pudo lanzar el hilo de captura: {e}");
                return false;
            }
        };
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(CaptureSession { stop, handle });

        let started = matches!(
            tokio::time::timeout(self.config.startup_timeout, ready_rx).await,
            Ok(Ok(true))
        );
        if !started {
            warn!("⚠️ {path} no entregó frames a tiempo.");
            self.release();
        }
        started
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        self.frames.borrow().clone()
    }

    fn release(&self) {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(session) = session {
            session.stop.store(true, Ordering::Release);
            self.retired
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(session.handle);
            info!("📷 Stream de cámara liberado.");
        }
        self.frames.send_replace(None);
    }
}
