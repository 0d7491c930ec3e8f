use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::application::haptics::HapticService;
use crate::application::ports::DisplayPort;
use crate::application::speech_service::SpeechService;
use crate::domain::{
    detection::DetectionBatch,
    hazard::{evaluate, HazardAssessment, HazardPolicy},
    speech::SpeechRequest,
    stream::{box_overlays, result_entries, DisplayEvent},
};

/// Destino de los lotes: pinta la lista y las cajas, y dispara las alertas.
///
/// Pintar y alertar son independientes: ocultar las cajas no silencia la voz,
/// y silenciar la voz no impide pintar ni vibrar ante un peligro.
pub struct ResultsSink {
    display: Arc<dyn DisplayPort>,
    speech: Arc<SpeechService>,
    haptics: Arc<HapticService>,
    policy: HazardPolicy,
    active: AtomicBool,
    speak_results: AtomicBool,
    show_boxes: AtomicBool,
}

impl ResultsSink {
    pub fn new(
        display: Arc<dyn DisplayPort>,
        speech: Arc<SpeechService>,
        haptics: Arc<HapticService>,
        policy: HazardPolicy,
    ) -> Self {
        Self {
            display,
            speech,
            haptics,
            policy,
            active: AtomicBool::new(false),
            speak_results: AtomicBool::new(true),
            show_boxes: AtomicBool::new(true),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
        if !active {
            self.display.publish(DisplayEvent::ClearResults);
            self.display.publish(DisplayEvent::ClearBoxes);
        }
    }

    pub fn speaks_results(&self) -> bool {
        self.speak_results.load(Ordering::SeqCst)
    }

    pub fn set_speak_results(&self, speak: bool) {
        self.speak_results.store(speak, Ordering::SeqCst);
    }

    pub fn shows_boxes(&self) -> bool {
        self.show_boxes.load(Ordering::SeqCst)
    }

    pub fn set_show_boxes(&self, show: bool) {
        self.show_boxes.store(show, Ordering::SeqCst);
        if !show {
            self.display.publish(DisplayEvent::ClearBoxes);
        }
    }

    /// Devuelve la valoración cuando hubo algo que evaluar.
    pub fn handle(&self, batch: &DetectionBatch) -> Option<HazardAssessment> {
        if !self.is_active() {
            return None;
        }
        self.render(batch);
        self.alert(batch)
    }

    fn render(&self, batch: &DetectionBatch) {
        self.display.publish(DisplayEvent::Results {
            entries: result_entries(batch),
        });
        if self.shows_boxes() {
            self.display.publish(DisplayEvent::Boxes {
                frame: batch.frame(),
                boxes: box_overlays(batch),
            });
        }
    }

    fn alert(&self, batch: &DetectionBatch) -> Option<HazardAssessment> {
        if batch.is_empty() {
            return None;
        }
        let assessment = evaluate(batch, &self.policy);
        if assessment.is_hazard() {
            self.haptics.alert_hazard();
        }
        if self.speaks_results() {
            let request = SpeechRequest {
                text: assessment.spoken_summary().to_string(),
                priority: assessment.is_hazard(),
            };
            self.speech.speak(request);
        }
        Some(assessment)
    }
}
