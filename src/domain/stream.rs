use serde::Serialize;

use super::camera::FrameSize;
use super::detection::{BoundingBox, DetectionBatch};
use super::hazard::DistanceBand;

/// Fila de la lista de resultados.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub label: String,
    pub distance: DistanceBand,
    pub confidence_pct: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxOverlay {
    pub bbox: BoundingBox,
    pub caption: String,
}

/// Mensajes que se empujan a los paneles conectados por `/ws/stream`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEvent {
    Results { entries: Vec<ResultEntry> },
    ClearResults,
    Boxes { frame: FrameSize, boxes: Vec<BoxOverlay> },
    ClearBoxes,
    Theme { high_contrast: bool },
    Vibrate { pattern: Vec<u32> },
}

fn confidence_pct(confidence: f32) -> u32 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u32
}

pub fn result_entries(batch: &DetectionBatch) -> Vec<ResultEntry> {
    batch
        .detections()
        .iter()
        .map(|d| ResultEntry {
            label: d.label.clone(),
            distance: DistanceBand::from_area_fraction(batch.area_fraction(d)),
            confidence_pct: confidence_pct(d.confidence),
        })
        .collect()
}

pub fn box_overlays(batch: &DetectionBatch) -> Vec<BoxOverlay> {
    batch
        .detections()
        .iter()
        .map(|d| BoxOverlay {
            bbox: d.bbox,
            caption: format!("{} ({}%)", d.label, confidence_pct(d.confidence)),
        })
        .collect()
}
