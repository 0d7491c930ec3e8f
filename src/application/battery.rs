use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::application::ports::BatteryPort;
use crate::application::speech_service::SpeechService;
use crate::domain::battery::{status_text, BatteryAlerts};
use crate::domain::speech::SpeechRequest;

pub struct BatteryService {
    port: Arc<dyn BatteryPort>,
    alerts: Mutex<BatteryAlerts>,
    alerts_enabled: AtomicBool,
}

impl BatteryService {
    pub fn new(port: Arc<dyn BatteryPort>, alerts_enabled: bool) -> Self {
        Self {
            port,
            alerts: Mutex::new(BatteryAlerts::default()),
            alerts_enabled: AtomicBool::new(alerts_enabled),
        }
    }

    pub fn set_alerts_enabled(&self, enabled: bool) {
        self.alerts_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn status_text(&self) -> String {
        status_text(self.port.read())
    }

    /// Mensaje de batería baja si se acaba de cruzar un umbral.
    pub fn check(&self) -> Option<&'static str> {
        if !self.alerts_enabled.load(Ordering::SeqCst) {
            return None;
        }
        let reading = self.port.read()?;
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .check(reading.level)
    }

    pub fn spawn_monitor(self: &Arc<Self>, speech: Arc<SpeechService>, period: Duration) -> JoinHandle<()> {
        let battery = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Some(message) = battery.check() {
                    info!("🔋 {message}");
                    speech.speak(SpeechRequest::priority(message));
                }
            }
        })
    }
}
