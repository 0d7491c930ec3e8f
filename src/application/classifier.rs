use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::application::ports::ObjectModelPort;
use crate::domain::{
    camera::Frame,
    detection::DetectionBatch,
    errors::DomainResult,
};

pub const MIN_DETECTION_THRESHOLD: f32 = 0.1;
pub const MAX_DETECTION_THRESHOLD: f32 = 1.0;

/// Frontera con el modelo de detección: carga única y filtrado por confianza
/// antes de que los lotes lleguen al evaluador de peligro.
pub struct Classifier {
    model: Arc<dyn ObjectModelPort>,
    threshold: RwLock<f32>,
    loaded: Mutex<bool>,
}

impl Classifier {
    pub fn new(model: Arc<dyn ObjectModelPort>, threshold: f32) -> Self {
        Self {
            model,
            threshold: RwLock::new(clamp_threshold(threshold)),
            loaded: Mutex::new(false),
        }
    }

    /// Carga el modelo si aún no lo está. Las llamadas concurrentes esperan a la misma carga.
    pub async fn ensure_ready(&self) -> bool {
        let mut loaded = self.loaded.lock().await;
        if *loaded {
            return true;
        }
        match self.model.load().await {
            Ok(()) => {
                info!("✅ Modelo de detección cargado.");
                *loaded = true;
                true
            }
            Err(e) => {
                error!("❌ No se pudo cargar el modelo de detección: {e}");
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.try_lock().map(|l| *l).unwrap_or(false)
    }

    pub fn threshold(&self) -> f32 {
        *self.threshold.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_threshold(&self, threshold: f32) {
        *self.threshold.write().unwrap_or_else(PoisonError::into_inner) = clamp_threshold(threshold);
    }

    pub async fn detect(&self, frame: Arc<Frame>) -> DomainResult<DetectionBatch> {
        let size = frame.size;
        let raw = self.model.detect(frame).await?;
        let threshold = self.threshold();
        let kept = raw.into_iter().filter(|d| d.confidence >= threshold).collect();
        Ok(DetectionBatch::new(size, kept))
    }
}

fn clamp_threshold(threshold: f32) -> f32 {
    if threshold.is_nan() {
        return MIN_DETECTION_THRESHOLD;
    }
    threshold.clamp(MIN_DETECTION_THRESHOLD, MAX_DETECTION_THRESHOLD)
}
