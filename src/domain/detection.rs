use serde::{Deserialize, Serialize};

use super::camera::FrameSize;

/// Caja en coordenadas de píxel del frame: esquina superior izquierda + tamaño.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            confidence,
        }
    }
}

/// Resultado de una única llamada de clasificación.
///
/// El orden es el que entrega el clasificador. Los campos son privados: un lote
/// no se modifica después de crearse y los consumidores lo comparten detrás de un `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionBatch {
    frame: FrameSize,
    detections: Vec<Detection>,
}

impl DetectionBatch {
    pub fn new(frame: FrameSize, detections: Vec<Detection>) -> Self {
        Self { frame, detections }
    }

    pub fn empty(frame: FrameSize) -> Self {
        Self::new(frame, Vec::new())
    }

    pub fn frame(&self) -> FrameSize {
        self.frame
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Fracción del frame que ocupa la caja, normalizada con las dimensiones reales
    /// del frame para que los umbrales no dependan de la resolución.
    pub fn area_fraction(&self, detection: &Detection) -> f32 {
        let frame_area = self.frame.area();
        if frame_area <= 0.0 {
            return 0.0;
        }
        detection.bbox.area() / frame_area
    }
}
