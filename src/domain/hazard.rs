//! Evaluación de peligro: función pura de un lote de detecciones a una
//! valoración con el texto que se va a pronunciar.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::detection::{Detection, DetectionBatch};

pub const DEFAULT_HAZARD_CLASSES: [&str; 5] = ["person", "car", "truck", "bicycle", "motorcycle"];
pub const DEFAULT_HAZARD_AREA_THRESHOLD: f32 = 0.4;
pub const DEFAULT_SUMMARY_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct HazardPolicy {
    pub hazard_classes: HashSet<String>,
    /// Fracción de área del frame (0..1) que hay que superar para considerar peligro.
    pub area_threshold: f32,
    /// Máximo de objetos en el resumen hablado cuando no hay peligro.
    pub summary_limit: usize,
}

impl Default for HazardPolicy {
    fn default() -> Self {
        Self {
            hazard_classes: DEFAULT_HAZARD_CLASSES.iter().map(|c| c.to_string()).collect(),
            area_threshold: DEFAULT_HAZARD_AREA_THRESHOLD,
            summary_limit: DEFAULT_SUMMARY_LIMIT,
        }
    }
}

impl HazardPolicy {
    pub fn is_hazard(&self, batch: &DetectionBatch, detection: &Detection) -> bool {
        self.hazard_classes.contains(&detection.label)
            && batch.area_fraction(detection) > self.area_threshold
    }
}

/// Estimación cualitativa de distancia a partir de la fracción de área.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBand {
    VeryClose,
    Close,
    Nearby,
    FarAway,
}

impl DistanceBand {
    pub fn from_area_fraction(fraction: f32) -> Self {
        if fraction > 0.5 {
            DistanceBand::VeryClose
        } else if fraction > 0.3 {
            DistanceBand::Close
        } else if fraction > 0.1 {
            DistanceBand::Nearby
        } else {
            DistanceBand::FarAway
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceBand::VeryClose => "very close",
            DistanceBand::Close => "close",
            DistanceBand::Nearby => "nearby",
            DistanceBand::FarAway => "far away",
        }
    }
}

impl fmt::Display for DistanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Valoración derivada de un lote. Nunca se persiste.
///
/// `is_hazard()` se deriva de `primary_hazard`, así que no puede haber peligro
/// sin detección principal.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardAssessment {
    primary_hazard: Option<Detection>,
    spoken_summary: String,
}

impl HazardAssessment {
    pub fn is_hazard(&self) -> bool {
        self.primary_hazard.is_some()
    }

    pub fn primary_hazard(&self) -> Option<&Detection> {
        self.primary_hazard.as_ref()
    }

    pub fn spoken_summary(&self) -> &str {
        &self.spoken_summary
    }
}

pub fn evaluate(batch: &DetectionBatch, policy: &HazardPolicy) -> HazardAssessment {
    if let Some(hazard) = batch
        .detections()
        .iter()
        .find(|d| policy.is_hazard(batch, d))
    {
        return HazardAssessment {
            spoken_summary: format!("Caution! {} very close", hazard.label),
            primary_hazard: Some(hazard.clone()),
        };
    }

    let spoken_summary = batch
        .detections()
        .iter()
        .take(policy.summary_limit)
        .map(|d| {
            let band = DistanceBand::from_area_fraction(batch.area_fraction(d));
            format!("{} {}", d.label, band)
        })
        .collect::<Vec<_>>()
        .join(", ");

    HazardAssessment {
        primary_hazard: None,
        spoken_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::camera::FrameSize;
    use crate::domain::detection::BoundingBox;

    // Frame de 100x100: una caja de `percent` x 100 ocupa exactamente `percent`%.
    fn det(label: &str, percent: f32) -> Detection {
        Detection::new(label, BoundingBox::new(0.0, 0.0, percent, 100.0), 0.9)
    }

    fn batch(detections: Vec<Detection>) -> DetectionBatch {
        DetectionBatch::new(FrameSize::new(100, 100), detections)
    }

    #[test]
    fn close_car_is_a_hazard() {
        let b = batch(vec![det("car", 60.0)]);
        let a = evaluate(&b, &HazardPolicy::default());
        assert!(a.is_hazard());
        assert_eq!(a.primary_hazard().map(|d| d.label.as_str()), Some("car"));
        assert_eq!(a.spoken_summary(), "Caution! car very close");
    }

    #[test]
    fn summary_covers_first_three_in_batch_order() {
        let b = batch(vec![
            det("chair", 5.0),
            det("table", 15.0),
            det("lamp", 35.0),
            det("cup", 2.0),
        ]);
        let a = evaluate(&b, &HazardPolicy::default());
        assert!(!a.is_hazard());
        assert!(a.primary_hazard().is_none());
        assert_eq!(a.spoken_summary(), "chair far away, table nearby, lamp close");
    }

    #[test]
    fn empty_batch_says_nothing() {
        let a = evaluate(&batch(vec![]), &HazardPolicy::default());
        assert!(!a.is_hazard());
        assert_eq!(a.spoken_summary(), "");
    }

    #[test]
    fn first_hazard_in_batch_order_wins() {
        let b = batch(vec![det("chair", 70.0), det("person", 45.0), det("truck", 90.0)]);
        let a = evaluate(&b, &HazardPolicy::default());
        assert_eq!(a.spoken_summary(), "Caution! person very close");
    }

    #[test]
    fn threshold_must_be_exceeded_not_reached() {
        let a = evaluate(&batch(vec![det("person", 40.0)]), &HazardPolicy::default());
        assert!(!a.is_hazard());
        assert_eq!(a.spoken_summary(), "person close");
    }

    #[test]
    fn large_non_hazard_class_is_only_described() {
        let a = evaluate(&batch(vec![det("sofa", 80.0)]), &HazardPolicy::default());
        assert!(!a.is_hazard());
        assert_eq!(a.spoken_summary(), "sofa very close");
    }

    #[test]
    fn area_is_normalized_against_frame_resolution() {
        // La misma proporción en 1280x720 debe disparar igual que en 100x100.
        let hd = DetectionBatch::new(
            FrameSize::new(1280, 720),
            vec![Detection::new("car", BoundingBox::new(0.0, 0.0, 1280.0 * 0.6, 720.0), 0.8)],
        );
        assert!(evaluate(&hd, &HazardPolicy::default()).is_hazard());

        // Un área de miles de píxeles sigue siendo pequeña en un frame grande.
        let small = DetectionBatch::new(
            FrameSize::new(1920, 1080),
            vec![Detection::new("car", BoundingBox::new(10.0, 10.0, 100.0, 100.0), 0.8)],
        );
        let a = evaluate(&small, &HazardPolicy::default());
        assert!(!a.is_hazard());
        assert_eq!(a.spoken_summary(), "car far away");
    }

    #[test]
    fn zero_sized_frame_never_triggers() {
        let b = DetectionBatch::new(FrameSize::default(), vec![det("car", 60.0)]);
        assert!(!evaluate(&b, &HazardPolicy::default()).is_hazard());
    }

    #[test]
    fn custom_policy_limit_and_classes() {
        let policy = HazardPolicy {
            hazard_classes: ["dog".to_string()].into_iter().collect(),
            area_threshold: 0.2,
            summary_limit: 1,
        };
        let b = batch(vec![det("car", 60.0), det("chair", 12.0)]);
        let a = evaluate(&b, &policy);
        assert!(!a.is_hazard());
        assert_eq!(a.spoken_summary(), "car very close");

        let a = evaluate(&batch(vec![det("dog", 25.0)]), &policy);
        assert_eq!(a.spoken_summary(), "Caution! dog very close");
    }

    #[test]
    fn distance_bands() {
        assert_eq!(DistanceBand::from_area_fraction(0.51), DistanceBand::VeryClose);
        assert_eq!(DistanceBand::from_area_fraction(0.5), DistanceBand::Close);
        assert_eq!(DistanceBand::from_area_fraction(0.31), DistanceBand::Close);
        assert_eq!(DistanceBand::from_area_fraction(0.3), DistanceBand::Nearby);
        assert_eq!(DistanceBand::from_area_fraction(0.1), DistanceBand::FarAway);
        assert_eq!(DistanceBand::from_area_fraction(0.0), DistanceBand::FarAway);
    }
}
