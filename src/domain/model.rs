use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_size: u32,        // 640 typical
    pub score_floor: f32,       // descarte previo; el umbral del usuario se aplica después
    pub iou_threshold: f32,     // 0..1
    pub max_detections: usize,  // e.g. 100
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            score_floor: 0.1,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}
