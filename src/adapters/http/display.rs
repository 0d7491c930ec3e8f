use tokio::sync::broadcast;
use tracing::debug;

use crate::application::ports::{DisplayPort, HapticPort};
use crate::domain::stream::DisplayEvent;

/// Reparte los eventos de pantalla entre los paneles conectados a `/ws/stream`.
/// Sin paneles conectados los eventos se pierden.
pub struct BroadcastDisplay {
    tx: broadcast::Sender<DisplayEvent>,
}

impl BroadcastDisplay {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.tx.subscribe()
    }
}

impl DisplayPort for BroadcastDisplay {
    fn publish(&self, event: DisplayEvent) {
        let _ = self.tx.send(event);
    }
}

/// El dispositivo que vibra es el panel del usuario: el patrón viaja como evento.
impl HapticPort for BroadcastDisplay {
    fn vibrate(&self, pattern: &[u32]) {
        debug!("📳 Vibración {:?}", pattern);
        self.publish(DisplayEvent::Vibrate {
            pattern: pattern.to_vec(),
        });
    }
}
