use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    application::{
        battery::BatteryService,
        classifier::Classifier,
        commands::{CommandAction, VoiceCommands},
        detection_loop::{DetectionLoop, LoopState, ResultHandler},
        emergency::EmergencyService,
        haptics::HapticService,
        location::LocationService,
        ports::{DisplayPort, SettingsPort},
        results::ResultsSink,
        speech_service::SpeechService,
    },
    domain::{
        camera::CameraFacing,
        errors::{Collaborator, DomainError, DomainResult},
        settings::Settings,
        speech::SpeechRequest,
        stream::DisplayEvent,
    },
};

/// Ajustes vigentes más el almacén donde se guardan.
pub struct SettingsService {
    store: Arc<dyn SettingsPort>,
    current: RwLock<Settings>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsPort>) -> Self {
        let current = store.load();
        Self {
            store,
            current: RwLock::new(current),
        }
    }

    pub fn current(&self) -> Settings {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Sustituye los ajustes en memoria y los persiste. `false` si no se pudieron guardar.
    pub fn save(&self, settings: Settings) -> bool {
        let saved = self.store.save(&settings);
        if !saved {
            warn!("⚠️ No se pudieron guardar los ajustes; se mantienen en memoria.");
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = settings;
        saved
    }

    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Settings {
        let mut next = self.current();
        change(&mut next);
        self.save(next.clone());
        next
    }

    pub fn reset(&self) -> Settings {
        self.store.clear();
        let defaults = Settings::default();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = defaults.clone();
        defaults
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantStatus {
    pub loop_state: LoopState,
    pub facing: CameraFacing,
    pub model_ready: bool,
    pub speak_results: bool,
    pub show_boxes: bool,
    pub high_contrast: bool,
    pub speaking: bool,
    pub emergency_active: bool,
    pub listening: bool,
    pub location: String,
    pub battery: String,
    pub voice_commands: Vec<String>,
    pub languages: Vec<String>,
}

/// Servicios que necesita el asistente, construidos explícitamente en `main`.
pub struct AssistantParts {
    pub detection: DetectionLoop,
    pub classifier: Arc<Classifier>,
    pub results: Arc<ResultsSink>,
    pub speech: Arc<SpeechService>,
    pub haptics: Arc<HapticService>,
    pub location: Arc<LocationService>,
    pub emergency: Arc<EmergencyService>,
    pub battery: Arc<BatteryService>,
    pub settings: Arc<SettingsService>,
    pub display: Arc<dyn DisplayPort>,
}

/// Coordina las acciones del usuario sobre los servicios. Toda acción empieza
/// con un pulso háptico y los anuncios van como voz prioritaria para que el
/// intervalo de los resúmenes no los descarte.
pub struct AssistantService {
    detection: DetectionLoop,
    classifier: Arc<Classifier>,
    results: Arc<ResultsSink>,
    speech: Arc<SpeechService>,
    haptics: Arc<HapticService>,
    location: Arc<LocationService>,
    emergency: Arc<EmergencyService>,
    battery: Arc<BatteryService>,
    settings: Arc<SettingsService>,
    display: Arc<dyn DisplayPort>,
    commands: VoiceCommands,
    listening: AtomicBool,
}

impl AssistantService {
    pub fn new(parts: AssistantParts) -> Arc<Self> {
        let assistant = Arc::new(Self {
            detection: parts.detection,
            classifier: parts.classifier,
            results: parts.results,
            speech: parts.speech,
            haptics: parts.haptics,
            location: parts.location,
            emergency: parts.emergency,
            battery: parts.battery,
            settings: parts.settings,
            display: parts.display,
            commands: VoiceCommands::new(),
            listening: AtomicBool::new(false),
        });
        assistant.apply_settings(&assistant.settings.current());
        assistant.register_voice_commands();
        assistant
    }

    fn announce(&self, text: impl Into<String>) {
        self.speech.speak(SpeechRequest::priority(text));
    }

    pub fn speech(&self) -> &Arc<SpeechService> {
        &self.speech
    }

    pub async fn start(&self) -> DomainResult<()> {
        self.haptics.press();
        self.results.set_active(true);

        let sink = Arc::clone(&self.results);
        let handler: ResultHandler = Arc::new(move |batch| {
            sink.handle(&batch);
        });

        match self.detection.start(handler).await {
            Ok(()) => {
                self.announce("OpenVision started. Ready to assist you.");
                Ok(())
            }
            Err(e) => Err(self.start_failed(e)),
        }
    }

    /// Un arranque relevado por otro no apaga nada: la sesión nueva ya es dueña del sink.
    fn start_failed(&self, e: DomainError) -> DomainError {
        if matches!(e, DomainError::Cancelled) {
            debug!("Arranque de la detección relevado por otro posterior.");
            return e;
        }
        error!("❌ No se pudo arrancar la detección: {e}");
        if self.detection.state() == LoopState::Idle {
            self.results.set_active(false);
        }
        if let DomainError::NotReady(what) = &e {
            let spoken = match what {
                Collaborator::Camera => "Camera unavailable",
                Collaborator::Model => "Object detection unavailable",
                Collaborator::Geolocation => "Location unavailable",
            };
            self.announce(spoken);
        }
        e
    }

    pub fn stop(&self) {
        self.detection.stop();
        self.results.set_active(false);
        self.speech.stop();
    }

    pub fn toggle_speech(&self) -> bool {
        self.haptics.press();
        let enabled = !self.results.speaks_results();
        self.results.set_speak_results(enabled);
        self.announce(if enabled { "Speech enabled" } else { "Speech disabled" });
        enabled
    }

    pub fn toggle_boxes(&self) -> bool {
        self.haptics.press();
        let show = !self.results.shows_boxes();
        self.results.set_show_boxes(show);
        self.announce(if show { "Bounding boxes shown" } else { "Bounding boxes hidden" });
        show
    }

    pub fn toggle_high_contrast(&self) -> bool {
        self.haptics.press();
        let updated = self.settings.update(|s| s.high_contrast = !s.high_contrast);
        self.display.publish(DisplayEvent::Theme {
            high_contrast: updated.high_contrast,
        });
        self.announce(if updated.high_contrast {
            "High contrast mode enabled"
        } else {
            "High contrast mode disabled"
        });
        updated.high_contrast
    }

    pub fn battery_status(&self) -> String {
        self.haptics.press();
        let status = self.battery.status_text();
        self.announce(status.clone());
        status
    }

    pub async fn location_status(&self) -> String {
        self.haptics.press();
        if self.location.is_enabled() {
            self.location.refresh().await;
        } else {
            self.location.enable_tracking().await;
        }
        let spoken = format!("Your current location is {}", self.location.location_string());
        self.announce(spoken.clone());
        spoken
    }

    pub fn emergency(&self) {
        self.haptics.press();
        self.emergency.activate();
    }

    pub fn dismiss_emergency(&self) {
        self.haptics.press();
        self.emergency.dismiss();
    }

    /// URI `tel:` del contacto `index` de la lista de emergencia.
    pub fn call_contact(&self, index: usize) -> DomainResult<String> {
        self.haptics.press();
        let contact = self
            .emergency
            .contacts()
            .into_iter()
            .nth(index)
            .ok_or_else(|| DomainError::NotFound(format!("contacto de emergencia {index}")))?;
        Ok(self.emergency.call(&contact))
    }

    pub async fn share_emergency_location(&self) -> String {
        self.haptics.press();
        self.emergency.share_location().await
    }

    pub fn open_settings(&self) -> Settings {
        self.haptics.press();
        self.settings.current()
    }

    /// Aplica los ajustes a todos los servicios y después los persiste.
    pub fn save_settings(&self, settings: Settings) -> bool {
        self.apply_settings(&settings);
        let saved = self.settings.save(settings);
        self.announce("Settings saved");
        saved
    }

    fn apply_settings(&self, settings: &Settings) {
        self.speech.update_settings(settings.speech.clone());
        self.classifier.set_threshold(settings.detection_threshold);
        self.haptics.set_enabled(settings.haptic_feedback);
        self.battery.set_alerts_enabled(settings.battery_alerts);
        self.emergency.update_contacts(settings.emergency_contacts.clone());
        self.display.publish(DisplayEvent::Theme {
            high_contrast: settings.high_contrast,
        });
    }

    pub async fn switch_camera(&self) -> DomainResult<CameraFacing> {
        self.haptics.press();
        let facing = self
            .detection
            .switch_facing()
            .await
            .map_err(|e| self.start_failed(e))?;
        info!("🔄 Cámara cambiada a {:?}", facing);
        Ok(facing)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Activa o desactiva la escucha de órdenes de voz. Arranca desactivada.
    pub fn toggle_voice_commands(&self) -> bool {
        self.haptics.press();
        let listening = !self.listening.fetch_xor(true, Ordering::SeqCst);
        self.announce(if listening {
            "Voice commands activated"
        } else {
            "Voice commands deactivated"
        });
        listening
    }

    /// Con la escucha desactivada las transcripciones se ignoran.
    pub fn handle_command(&self, transcript: &str) -> Option<String> {
        if !self.is_listening() {
            debug!("Orden de voz ignorada (escucha desactivada): {transcript:?}");
            return None;
        }
        self.commands.dispatch(transcript)
    }

    /// Estado completo para la interfaz. La posición se vuelve a consultar si hay seguimiento.
    pub async fn status(&self) -> AssistantStatus {
        self.location.refresh().await;
        let settings = self.settings.current();
        AssistantStatus {
            loop_state: self.detection.state(),
            facing: self.detection.facing(),
            model_ready: self.classifier.is_ready(),
            speak_results: self.results.speaks_results(),
            show_boxes: self.results.shows_boxes(),
            high_contrast: settings.high_contrast,
            speaking: self.speech.is_speaking(),
            emergency_active: self.emergency.is_active(),
            listening: self.is_listening(),
            location: self.location.location_string(),
            battery: self.battery.status_text(),
            voice_commands: self.commands.phrases(),
            languages: self.speech.available_languages(),
        }
    }

    fn register_voice_commands(self: &Arc<Self>) {
        // Las acciones guardan un Weak: el registro vive dentro del propio asistente.
        let weak = Arc::downgrade(self);
        let on = |f: fn(&AssistantService)| {
            let weak: Weak<AssistantService> = weak.clone();
            Arc::new(move || {
                if let Some(assistant) = weak.upgrade() {
                    f(&assistant);
                }
            }) as CommandAction
        };

        self.commands.register("start speaking", on(|a| {
            if !a.results.speaks_results() {
                a.toggle_speech();
            }
        }));
        self.commands.register("stop speaking", on(|a| {
            if a.results.speaks_results() {
                a.toggle_speech();
            }
        }));
        self.commands.register("emergency", on(|a| a.emergency()));
        self.commands.register("settings", on(|a| {
            a.open_settings();
            a.announce("Settings opened");
        }));
        self.commands.register("toggle boxes", on(|a| {
            a.toggle_boxes();
        }));
        self.commands.register("battery", on(|a| {
            a.battery_status();
        }));
        self.commands.register("high contrast", on(|a| {
            a.toggle_high_contrast();
        }));

        let weak_location = Arc::downgrade(self);
        self.commands.register("location", Arc::new(move || {
            if let Some(assistant) = weak_location.upgrade() {
                tokio::spawn(async move {
                    assistant.location_status().await;
                });
            }
        }));
    }
}
