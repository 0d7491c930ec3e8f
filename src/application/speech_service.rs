use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::application::ports::SpeechEnginePort;
use crate::domain::settings::SpeechSettings;
use crate::domain::speech::{SpeechOutcome, SpeechRequest, Utterance};

pub const DEFAULT_MIN_GAP: Duration = Duration::from_millis(2000);

/// Canal único de voz: toda locución pasa por aquí.
///
/// Las peticiones prioritarias cortan lo que suene y no respetan el intervalo.
/// Las normales se descartan si llegan antes de `min_gap` desde la última aceptada.
/// Nada se encola: lo descartado se pierde.
pub struct SpeechService {
    engine: Arc<dyn SpeechEnginePort>,
    settings: RwLock<SpeechSettings>,
    last_accepted: Mutex<Option<Instant>>,
    min_gap: Duration,
}

impl SpeechService {
    pub fn new(engine: Arc<dyn SpeechEnginePort>, settings: SpeechSettings, min_gap: Duration) -> Self {
        Self {
            engine,
            settings: RwLock::new(settings),
            last_accepted: Mutex::new(None),
            min_gap,
        }
    }

    pub fn update_settings(&self, settings: SpeechSettings) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn settings(&self) -> SpeechSettings {
        self.settings.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_speaking(&self) -> bool {
        self.engine.is_speaking()
    }

    pub fn speak(&self, request: SpeechRequest) -> SpeechOutcome {
        let text = request.text.trim();
        if text.is_empty() {
            return SpeechOutcome::Ignored;
        }

        if request.priority {
            let preempted = self.engine.is_speaking();
            if preempted {
                self.engine.cancel();
            }
            self.dispatch(text);
            return if preempted { SpeechOutcome::Preempted } else { SpeechOutcome::Spoken };
        }

        {
            let mut last = self.last_accepted.lock().unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            if let Some(previous) = *last {
                if now.saturating_duration_since(previous) < self.min_gap {
                    debug!("Locución descartada por intervalo mínimo: {text}");
                    return SpeechOutcome::Dropped;
                }
            }
            *last = Some(now);
        }

        self.dispatch(text);
        SpeechOutcome::Spoken
    }

    /// Corta cualquier locución en curso. Sin efecto si no suena nada.
    pub fn stop(&self) {
        self.engine.cancel();
    }

    pub fn available_languages(&self) -> Vec<String> {
        self.engine
            .voices()
            .into_iter()
            .map(|v| v.language)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn dispatch(&self, text: &str) {
        let utterance = self.render(text);
        info!("🎙️ Narrando: {}", utterance.text);
        self.engine.speak(utterance);
    }

    /// Aplica los ajustes vigentes y elige una voz del idioma configurado si existe.
    fn render(&self, text: &str) -> Utterance {
        let settings = self.settings();
        let voice = self
            .engine
            .voices()
            .into_iter()
            .find(|v| v.language.eq_ignore_ascii_case(&settings.language));
        Utterance {
            text: text.to_string(),
            rate: settings.rate,
            volume: settings.volume,
            language: settings.language,
            voice,
        }
    }
}
