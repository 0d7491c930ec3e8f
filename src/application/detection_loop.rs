//! Bucle de detección: muestrea frames al ritmo del reloj de refresco, con como
//! mucho una clasificación en vuelo, y entrega los lotes en orden de inicio.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::classifier::Classifier;
use crate::application::ports::{CameraPort, RefreshClock};
use crate::domain::{
    camera::{CameraFacing, Frame},
    detection::DetectionBatch,
    errors::{Collaborator, DomainError, DomainResult},
};

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Destino de cada lote clasificado.
pub type ResultHandler = Arc<dyn Fn(Arc<DetectionBatch>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Idle,
    Starting,
    Running,
    Stopping,
}

struct LoopShared {
    state: LoopState,
    /// Se incrementa en cada arranque y en cada parada; un resultado de otra sesión se descarta.
    session: u64,
    in_flight: bool,
    /// Tick en el que se lanzó la última clasificación completada.
    last_launch: Option<Instant>,
    facing: CameraFacing,
    ticker: Option<JoinHandle<()>>,
    on_result: Option<ResultHandler>,
}

struct Inner {
    camera: Arc<dyn CameraPort>,
    classifier: Arc<Classifier>,
    clock: Arc<dyn RefreshClock>,
    min_interval: Duration,
    shared: Mutex<LoopShared>,
}

#[derive(Clone)]
pub struct DetectionLoop {
    inner: Arc<Inner>,
}

impl DetectionLoop {
    pub fn new(
        camera: Arc<dyn CameraPort>,
        classifier: Arc<Classifier>,
        clock: Arc<dyn RefreshClock>,
        min_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                camera,
                classifier,
                clock,
                min_interval,
                shared: Mutex::new(LoopShared {
                    state: LoopState::Idle,
                    session: 0,
                    in_flight: false,
                    last_launch: None,
                    facing: CameraFacing::default(),
                    ticker: None,
                    on_result: None,
                }),
            }),
        }
    }

    fn shared(&self) -> MutexGuard<'_, LoopShared> {
        self.inner.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LoopState {
        self.shared().state
    }

    pub fn facing(&self) -> CameraFacing {
        self.shared().facing
    }

    pub fn is_classifying(&self) -> bool {
        self.shared().in_flight
    }

    /// Arranca una sesión nueva. Si ya había una activa, la detiene antes.
    ///
    /// Falla con `NotReady` indicando qué colaborador no está disponible; en ese
    /// caso el bucle queda en `Idle`.
    pub async fn start(&self, on_result: ResultHandler) -> DomainResult<()> {
        if self.state() != LoopState::Idle {
            info!("Bucle de detección: deteniendo la sesión anterior antes de arrancar.");
            self.stop();
        }

        let (session, facing) = {
            let mut shared = self.shared();
            shared.state = LoopState::Starting;
            shared.session += 1;
            shared.last_launch = None;
            shared.on_result = Some(on_result);
            (shared.session, shared.facing)
        };

        if !self.inner.classifier.ensure_ready().await {
            return Err(self.abort_start(session, Collaborator::Model));
        }
        if !self.is_starting(session) {
            // Otro start() o un stop() tomó el relevo durante la carga: la cámara ya no es nuestra.
            return Err(DomainError::Cancelled);
        }
        if !self.inner.camera.acquire(facing).await {
            return Err(self.abort_start(session, Collaborator::Camera));
        }

        let mut shared = self.shared();
        if shared.session != session || shared.state != LoopState::Starting {
            // Llegó un stop() mientras esperábamos. Solo soltamos la cámara si
            // nadie más ha arrancado entretanto.
            let idle = shared.state == LoopState::Idle;
            drop(shared);
            if idle {
                self.inner.camera.release();
            }
            return Err(DomainError::Cancelled);
        }

        shared.state = LoopState::Running;
        let ticks = self.inner.clock.subscribe();
        shared.ticker = Some(tokio::spawn(self.clone().drive(ticks)));
        info!("🎥 Bucle de detección en marcha (cámara {:?}, intervalo {:?}).", facing, self.inner.min_interval);
        Ok(())
    }

    fn is_starting(&self, session: u64) -> bool {
        let shared = self.shared();
        shared.session == session && shared.state == LoopState::Starting
    }

    /// Deja el bucle en `Idle` si la sesión sigue siendo la vigente. Una
    /// sesión ya relevada no toca nada y se informa como `Cancelled`.
    fn abort_start(&self, session: u64, missing: Collaborator) -> DomainError {
        let mut shared = self.shared();
        if shared.session != session {
            return DomainError::Cancelled;
        }
        shared.state = LoopState::Idle;
        shared.on_result = None;
        drop(shared);
        self.inner.camera.release();
        DomainError::NotReady(missing)
    }

    /// Cancela la suscripción al reloj y libera la cámara. Idempotente.
    ///
    /// Una clasificación ya en vuelo no se cancela; su resultado se descarta al llegar.
    pub fn stop(&self) {
        let ticker = {
            let mut shared = self.shared();
            if shared.state == LoopState::Idle {
                return;
            }
            shared.state = LoopState::Stopping;
            shared.session += 1;
            shared.on_result = None;
            shared.ticker.take()
        };
        if let Some(ticker) = ticker {
            ticker.abort();
        }
        self.inner.camera.release();
        self.shared().state = LoopState::Idle;
        info!("⏹️ Bucle de detección detenido.");
    }

    /// Alterna cámara trasera/frontal. Con el bucle en marcha se libera el
    /// stream y se vuelve a adquirir: nunca hay dos abiertos a la vez.
    pub async fn switch_facing(&self) -> DomainResult<CameraFacing> {
        let (facing, restart) = {
            let mut shared = self.shared();
            shared.facing = shared.facing.toggled();
            let restart = match shared.state {
                LoopState::Running => shared.on_result.clone(),
                _ => None,
            };
            (shared.facing, restart)
        };
        if let Some(handler) = restart {
            self.stop();
            self.start(handler).await?;
        }
        Ok(facing)
    }

    async fn drive(self, mut ticks: mpsc::Receiver<Instant>) {
        while let Some(now) = ticks.recv().await {
            self.on_tick(now);
        }
        debug!("Reloj de refresco cerrado.");
    }

    /// Callback de cada tick del reloj. Síncrono: como mucho lanza una clasificación.
    pub fn on_tick(&self, now: Instant) {
        let (session, frame) = {
            let mut shared = self.shared();
            if shared.state != LoopState::Running || shared.in_flight {
                return;
            }
            if let Some(last) = shared.last_launch {
                if now.saturating_duration_since(last) < self.inner.min_interval {
                    return;
                }
            }
            let Some(frame) = self.inner.camera.current_frame() else {
                debug!("Tick sin frame disponible.");
                return;
            };
            shared.in_flight = true;
            (shared.session, frame)
        };

        tokio::spawn(self.clone().classify(session, now, frame));
    }

    async fn classify(self, session: u64, launched_at: Instant, frame: Arc<Frame>) {
        let size = frame.size;
        let batch = match self.inner.classifier.detect(frame).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("⚠️ Clasificación fallida, se trata como lote vacío: {e}");
                DetectionBatch::empty(size)
            }
        };

        let handler = {
            let mut shared = self.shared();
            if shared.session != session || shared.state != LoopState::Running {
                shared.in_flight = false;
                debug!("Resultado de una sesión detenida, descartado.");
                return;
            }
            shared.last_launch = Some(launched_at);
            shared.on_result.clone()
        };

        // El hueco en vuelo se libera tras la entrega para que dos lotes nunca se intercalen.
        if let Some(handler) = handler {
            handler(Arc::new(batch));
        }
        self.shared().in_flight = false;
    }
}
