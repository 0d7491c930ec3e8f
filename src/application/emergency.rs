use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::application::location::LocationService;
use crate::application::speech_service::SpeechService;
use crate::domain::settings::EmergencyContact;
use crate::domain::speech::SpeechRequest;

/// Panel de emergencia: contactos, compartir ubicación y alerta al relay.
pub struct EmergencyService {
    speech: Arc<SpeechService>,
    location: Arc<LocationService>,
    contacts: RwLock<Vec<EmergencyContact>>,
    active: AtomicBool,
}

impl EmergencyService {
    pub fn new(speech: Arc<SpeechService>, location: Arc<LocationService>, contacts: Vec<EmergencyContact>) -> Self {
        Self {
            speech,
            location,
            contacts: RwLock::new(contacts),
            active: AtomicBool::new(false),
        }
    }

    pub fn update_contacts(&self, contacts: Vec<EmergencyContact>) {
        *self.contacts.write().unwrap_or_else(PoisonError::into_inner) = contacts;
    }

    pub fn contacts(&self) -> Vec<EmergencyContact> {
        self.contacts.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::SeqCst);
        info!("🚨 Asistencia de emergencia activada.");
        self.speech.speak(SpeechRequest::priority("Emergency assistance activated"));
    }

    pub fn dismiss(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Comparte la ubicación, anuncia el resultado y envía la alerta de emergencia.
    pub async fn share_location(&self) -> String {
        if !self.location.is_enabled() {
            self.location.enable_tracking().await;
        }
        let result = self.location.share_location().await;
        self.speech.speak(SpeechRequest::priority(result.clone()));
        self.location.send_emergency_alert().await;
        result
    }

    /// Devuelve la URI `tel:` del contacto para que la marque el dispositivo.
    pub fn call(&self, contact: &EmergencyContact) -> String {
        self.speech.speak(SpeechRequest::priority(format!("Calling {}", contact.name)));
        format!("tel:{}", contact.phone)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::application::ports::{GeolocationPort, RelayPort, SpeechEnginePort};
    use crate::domain::errors::{Collaborator, DomainError, DomainResult};
    use crate::domain::relay::{GeoPosition, RelayEvent};
    use crate::domain::settings::SpeechSettings;
    use crate::domain::speech::{Utterance, Voice};

    #[derive(Default)]
    struct Engine(Mutex<Vec<String>>);

    impl SpeechEnginePort for Engine {
        fn voices(&self) -> Vec<Voice> {
            Vec::new()
        }
        fn is_speaking(&self) -> bool {
            false
        }
        fn speak(&self, utterance: Utterance) {
            self.0.lock().unwrap().push(utterance.text);
        }
        fn cancel(&self) {}
    }

    struct NoFix;

    #[async_trait]
    impl GeolocationPort for NoFix {
        async fn current_position(&self) -> DomainResult<GeoPosition> {
            Err(DomainError::NotReady(Collaborator::Geolocation))
        }
    }

    struct Nowhere;

    impl RelayPort for Nowhere {
        fn publish(&self, _event: &RelayEvent) {}
    }

    fn service() -> (EmergencyService, Arc<Engine>) {
        let engine = Arc::new(Engine::default());
        let speech = Arc::new(SpeechService::new(engine.clone(), SpeechSettings::default(), Duration::from_secs(2)));
        let location = Arc::new(LocationService::new(Arc::new(NoFix), Arc::new(Nowhere)));
        let contacts = vec![EmergencyContact::new("Emergency Services", "911")];
        (EmergencyService::new(speech, location, contacts), engine)
    }

    #[tokio::test]
    async fn call_returns_tel_uri_and_announces_contact() {
        let (svc, engine) = service();
        let contact = svc.contacts()[0].clone();
        assert_eq!(svc.call(&contact), "tel:911");
        assert_eq!(engine.0.lock().unwrap().last().map(String::as_str), Some("Calling Emergency Services"));
    }

    #[tokio::test]
    async fn activation_is_announced_and_dismissable() {
        let (svc, engine) = service();
        svc.activate();
        assert!(svc.is_active());
        assert_eq!(engine.0.lock().unwrap()[0], "Emergency assistance activated");
        svc.dismiss();
        assert!(!svc.is_active());
    }

    #[tokio::test]
    async fn share_without_fix_speaks_unavailable() {
        let (svc, engine) = service();
        assert_eq!(svc.share_location().await, "Location unavailable");
        assert_eq!(engine.0.lock().unwrap().last().map(String::as_str), Some("Location unavailable"));
    }

    #[test]
    fn contacts_follow_settings() {
        let (svc, _) = service();
        svc.update_contacts(vec![EmergencyContact::new("Ana", "600")]);
        assert_eq!(svc.contacts(), vec![EmergencyContact::new("Ana", "600")]);
    }
}
