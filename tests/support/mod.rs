#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use tokio::sync::mpsc;
use tokio::time::Instant;

use openvision_assist::application::{
    battery::BatteryService,
    classifier::Classifier,
    detection_loop::DetectionLoop,
    emergency::EmergencyService,
    haptics::HapticService,
    location::LocationService,
    ports::{
        BatteryPort, CameraPort, DisplayPort, GeolocationPort, HapticPort, ObjectModelPort, RefreshClock,
        RelayPort, SettingsPort, SpeechEnginePort,
    },
    results::ResultsSink,
    services::{AssistantParts, AssistantService, SettingsService},
    speech_service::SpeechService,
};
use openvision_assist::domain::{
    battery::BatteryReading,
    camera::{CameraFacing, Frame},
    detection::{BoundingBox, Detection},
    errors::{Collaborator, DomainError, DomainResult},
    hazard::HazardPolicy,
    relay::{GeoPosition, RelayEvent},
    settings::Settings,
    speech::{Utterance, Voice},
    stream::DisplayEvent,
};

/// Cámara que entrega frames en blanco mientras `available` siga a `true`.
pub struct FakeCamera {
    pub available: AtomicBool,
}

#[async_trait]
impl CameraPort for FakeCamera {
    async fn acquire(&self, _facing: CameraFacing) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Option<Arc<Frame>> {
        Some(Arc::new(Frame::new(RgbImage::new(100, 100))))
    }

    fn release(&self) {}
}

/// Devuelve siempre las mismas detecciones. `load_ms` simula una carga lenta.
pub struct ScriptedModel {
    pub loads: AtomicBool,
    pub load_ms: AtomicU64,
    pub detections: Mutex<Vec<Detection>>,
}

impl ScriptedModel {
    pub fn returning(detections: Vec<Detection>) -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicBool::new(true),
            load_ms: AtomicU64::new(0),
            detections: Mutex::new(detections),
        })
    }
}

#[async_trait]
impl ObjectModelPort for ScriptedModel {
    async fn load(&self) -> DomainResult<()> {
        let delay = self.load_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.loads.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::NotFound("yolo11n.onnx".into()))
        }
    }

    async fn detect(&self, _frame: Arc<Frame>) -> DomainResult<Vec<Detection>> {
        Ok(self.detections.lock().unwrap().clone())
    }
}

/// Reloj movido a mano desde el test.
#[derive(Default)]
pub struct ManualClock {
    sender: Mutex<Option<mpsc::Sender<Instant>>>,
}

impl ManualClock {
    pub fn tick(&self) {
        if let Some(tx) = self.sender.lock().unwrap().as_ref() {
            let _ = tx.try_send(Instant::now());
        }
    }
}

impl RefreshClock for ManualClock {
    fn subscribe(&self) -> mpsc::Receiver<Instant> {
        let (tx, rx) = mpsc::channel(8);
        *self.sender.lock().unwrap() = Some(tx);
        rx
    }
}

#[derive(Default)]
pub struct RecordingEngine {
    pub spoken: Mutex<Vec<Utterance>>,
    pub cancels: Mutex<usize>,
}

impl RecordingEngine {
    pub fn texts(&self) -> Vec<String> {
        self.spoken.lock().unwrap().iter().map(|u| u.text.clone()).collect()
    }

    pub fn last(&self) -> Option<String> {
        self.texts().pop()
    }
}

impl SpeechEnginePort for RecordingEngine {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn is_speaking(&self) -> bool {
        false
    }

    fn speak(&self, utterance: Utterance) {
        self.spoken.lock().unwrap().push(utterance);
    }

    fn cancel(&self) {
        *self.cancels.lock().unwrap() += 1;
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn vibrations(&self) -> Vec<Vec<u32>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DisplayEvent::Vibrate { pattern } => Some(pattern),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: impl Fn(&DisplayEvent) -> bool) -> usize {
        self.events().iter().filter(|e| wanted(e)).count()
    }
}

impl DisplayPort for RecordingDisplay {
    fn publish(&self, event: DisplayEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl HapticPort for RecordingDisplay {
    fn vibrate(&self, pattern: &[u32]) {
        self.publish(DisplayEvent::Vibrate { pattern: pattern.to_vec() });
    }
}

#[derive(Default)]
pub struct RecordingRelay {
    pub events: Mutex<Vec<RelayEvent>>,
}

impl RelayPort for RecordingRelay {
    fn publish(&self, event: &RelayEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub saved: Mutex<Option<Settings>>,
}

impl SettingsPort for MemoryStore {
    fn load(&self) -> Settings {
        self.saved.lock().unwrap().clone().unwrap_or_default()
    }

    fn save(&self, settings: &Settings) -> bool {
        *self.saved.lock().unwrap() = Some(settings.clone());
        true
    }

    fn clear(&self) -> bool {
        *self.saved.lock().unwrap() = None;
        true
    }
}

/// Posición que el test puede mover entre consultas.
pub struct MovingGps(Mutex<Option<GeoPosition>>);

impl MovingGps {
    pub fn move_to(&self, position: Option<GeoPosition>) {
        *self.0.lock().unwrap() = position;
    }
}

#[async_trait]
impl GeolocationPort for MovingGps {
    async fn current_position(&self) -> DomainResult<GeoPosition> {
        self.0.lock().unwrap().ok_or(DomainError::NotReady(Collaborator::Geolocation))
    }
}

pub struct FixedBattery(pub Option<BatteryReading>);

impl BatteryPort for FixedBattery {
    fn read(&self) -> Option<BatteryReading> {
        self.0
    }
}

pub struct Harness {
    pub assistant: Arc<AssistantService>,
    pub model: Arc<ScriptedModel>,
    pub camera: Arc<FakeCamera>,
    pub gps: Arc<MovingGps>,
    pub clock: Arc<ManualClock>,
    pub engine: Arc<RecordingEngine>,
    pub display: Arc<RecordingDisplay>,
    pub relay: Arc<RecordingRelay>,
    pub store: Arc<MemoryStore>,
}

/// Ensambla el asistente completo sobre adaptadores falsos, igual que `main`.
pub fn harness(detections: Vec<Detection>, position: Option<GeoPosition>) -> Harness {
    let model = ScriptedModel::returning(detections);
    let camera = Arc::new(FakeCamera {
        available: AtomicBool::new(true),
    });
    let gps = Arc::new(MovingGps(Mutex::new(position)));
    let clock = Arc::new(ManualClock::default());
    let engine = Arc::new(RecordingEngine::default());
    let display = Arc::new(RecordingDisplay::default());
    let relay = Arc::new(RecordingRelay::default());
    let store = Arc::new(MemoryStore::default());

    let settings = Arc::new(SettingsService::new(store.clone()));
    let initial = settings.current();
    let speech = Arc::new(SpeechService::new(
        engine.clone(),
        initial.speech.clone(),
        Duration::from_millis(2000),
    ));
    let haptics = Arc::new(HapticService::new(display.clone(), initial.haptic_feedback));
    let classifier = Arc::new(Classifier::new(model.clone(), initial.detection_threshold));
    let results = Arc::new(ResultsSink::new(
        display.clone(),
        speech.clone(),
        haptics.clone(),
        HazardPolicy::default(),
    ));
    let detection = DetectionLoop::new(
        camera.clone(),
        classifier.clone(),
        clock.clone(),
        Duration::from_millis(500),
    );
    let location = Arc::new(LocationService::new(gps.clone(), relay.clone()));
    let emergency = Arc::new(EmergencyService::new(
        speech.clone(),
        location.clone(),
        initial.emergency_contacts.clone(),
    ));
    let battery = Arc::new(BatteryService::new(
        Arc::new(FixedBattery(Some(BatteryReading { level: 0.55, charging: true }))),
        initial.battery_alerts,
    ));

    let assistant = AssistantService::new(AssistantParts {
        detection,
        classifier,
        results,
        speech,
        haptics,
        location,
        emergency,
        battery,
        settings,
        display: display.clone(),
    });

    Harness {
        assistant,
        model,
        camera,
        gps,
        clock,
        engine,
        display,
        relay,
        store,
    }
}

/// Caja de `percent` x 100 en un frame de 100x100: ocupa `percent`% del frame.
pub fn det(label: &str, percent: f32) -> Detection {
    Detection::new(label, BoundingBox::new(0.0, 0.0, percent, 100.0), 0.9)
}

/// Deja correr las tareas lanzadas por el tick.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
