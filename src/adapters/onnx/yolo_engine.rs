use anyhow::{bail, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;

use crate::domain::detection::{BoundingBox, Detection};
use crate::domain::model::YoloParams;

/// Etiquetas COCO en el orden de salida de los modelos YOLO.
pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Candidato antes de la supresión de no máximos, en coordenadas del frame.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: usize,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn iou(&self, other: &Candidate) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = w * h;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    fn into_detection(self) -> Detection {
        let label = COCO_LABELS.get(self.class_id).copied().unwrap_or("object");
        Detection::new(
            label,
            BoundingBox::new(self.x1, self.y1, self.x2 - self.x1, self.y2 - self.y1),
            self.score,
        )
    }
}

pub struct OnnxYoloEngine {
    session: Session,
}

impl OnnxYoloEngine {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session })
    }

    pub fn infer(&mut self, rgb: &RgbImage, params: &YoloParams) -> Result<Vec<Detection>> {
        let imgsz = params.input_size as usize;
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                input[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let (data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, data))?;
        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.into_iter().map(|&x| x as usize).collect();
        let num_candidates = candidate_count(&dims)?;
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0);

        let (fw, fh) = (rgb.width() as f32, rgb.height() as f32);
        let sx = fw / imgsz as f32;
        let sy = fh / imgsz as f32;

        let mut candidates = Vec::new();
        for i in 0..num_candidates {
            let scores = view.slice(s![4.., i]);
            let Some((class_id, &score)) = scores.indexed_iter().max_by(|(_, a), (_, b)| a.total_cmp(b)) else {
                continue;
            };
            if score < params.score_floor {
                continue;
            }

            let cx = view[[0, i]];
            let cy = view[[1, i]];
            let w = view[[2, i]];
            let h = view[[3, i]];

            candidates.push(Candidate {
                x1: ((cx - w / 2.0) * sx).clamp(0.0, fw),
                y1: ((cy - h / 2.0) * sy).clamp(0.0, fh),
                x2: ((cx + w / 2.0) * sx).clamp(0.0, fw),
                y2: ((cy + h / 2.0) * sy).clamp(0.0, fh),
                score,
                class_id,
            });
        }

        Ok(suppress(candidates, params.iou_threshold, params.max_detections)
            .into_iter()
            .map(Candidate::into_detection)
            .collect())
    }
}

/// Número de candidatos de una salida `[1, 4 + clases, candidatos]`.
/// Cualquier otra forma se rechaza antes de indexar.
fn candidate_count(dims: &[usize]) -> Result<usize> {
    match dims {
        [1, rows, candidates] if *rows >= 5 => Ok(*candidates),
        _ => bail!("salida YOLO inesperada {dims:?}; se esperaba [1, 4 + clases, candidatos]"),
    }
}

/// NMS voraz por clase: ordena por puntuación y descarta solapes de la misma clase.
fn suppress(mut candidates: Vec<Candidate>, iou_threshold: f32, max: usize) -> Vec<Candidate> {
    candidates.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<Candidate> = Vec::new();
    for c in candidates {
        if kept.len() >= max {
            break;
        }
        if kept.iter().all(|k| k.class_id != c.class_id || k.iou(&c) <= iou_threshold) {
            kept.push(c);
        }
    }
    kept
}
