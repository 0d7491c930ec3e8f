use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::ObjectModelPort;
use crate::domain::{
    camera::Frame,
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::YoloParams,
};

/// Detector YOLO sobre ONNX Runtime. La sesión se crea en `load` y la
/// inferencia corre en el pool bloqueante de tokio.
pub struct OnnxDetector {
    path: PathBuf,
    params: YoloParams,
    engine: Arc<Mutex<Option<OnnxYoloEngine>>>,
}

impl OnnxDetector {
    pub fn new(path: impl Into<PathBuf>, params: YoloParams) -> Self {
        Self {
            path: path.into(),
            params,
            engine: Arc::new(Mutex::new(None)),
        }
    }
}

fn validate_model_path(path: &Path) -> DomainResult<()> {
    if path.as_os_str().is_empty() {
        return Err(DomainError::InvalidInput("ruta del modelo vacía".into()));
    }
    if !path.exists() {
        return Err(DomainError::NotFound(format!("modelo no encontrado: {}", path.display())));
    }
    Ok(())
}

#[async_trait]
impl ObjectModelPort for OnnxDetector {
    async fn load(&self) -> DomainResult<()> {
        validate_model_path(&self.path)?;
        let path = self.path.to_string_lossy().into_owned();
        let engine = Arc::clone(&self.engine);

        tokio::task::spawn_blocking(move || -> DomainResult<()> {
            let loaded = OnnxYoloEngine::load(&path)
                .map_err(|e| DomainError::OperationFailed(format!("cargando {path}: {e}")))?;
            *engine.lock().unwrap_or_else(PoisonError::into_inner) = Some(loaded);
            info!("🧠 Modelo ONNX listo: {}", path);
            Ok(())
        })
        .await
        .map_err(|e| DomainError::OperationFailed(e.to_string()))?
    }

    async fn detect(&self, frame: Arc<Frame>) -> DomainResult<Vec<Detection>> {
        let engine = Arc::clone(&self.engine);
        let params = self.params.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = engine.lock().unwrap_or_else(PoisonError::into_inner);
            let engine = guard
                .as_mut()
                .ok_or_else(|| DomainError::Classification("modelo sin cargar".into()))?;
            engine
                .infer(&frame.pixels, &params)
                .map_err(|e| DomainError::Classification(e.to_string()))
        })
        .await
        .map_err(|e| DomainError::Classification(e.to_string()))?
    }
}
