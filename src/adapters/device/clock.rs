use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::application::ports::RefreshClock;

/// Reloj de refresco sobre `tokio::time::interval`. Si el consumidor va
/// atrasado los ticks se descartan en lugar de acumularse.
pub struct IntervalClock {
    period: Duration,
}

impl IntervalClock {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn from_hz(hz: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / hz.max(1) as f64))
    }
}

impl RefreshClock for IntervalClock {
    fn subscribe(&self) -> mpsc::Receiver<Instant> {
        let (tx, rx) = mpsc::channel(1);
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    now = interval.tick() => {
                        match tx.try_send(now) {
                            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                            Err(mpsc::error::TrySendError::Closed(_)) => break,
                        }
                    }
                    _ = tx.closed() => break,
                }
            }
        });
        rx
    }
}
