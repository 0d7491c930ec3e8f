use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::application::ports::HapticPort;

pub const PRESS_PATTERN: [u32; 1] = [50];
pub const HAZARD_PATTERN: [u32; 5] = [100, 50, 100, 50, 200];

/// Vibraciones de "disparar y olvidar". Sin cola ni estado aparte del interruptor.
pub struct HapticService {
    device: Arc<dyn HapticPort>,
    enabled: AtomicBool,
}

impl HapticService {
    pub fn new(device: Arc<dyn HapticPort>, enabled: bool) -> Self {
        Self {
            device,
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Pulso corto de confirmación de una interacción.
    pub fn press(&self) {
        self.fire(&PRESS_PATTERN);
    }

    pub fn alert_hazard(&self) {
        self.fire(&HAZARD_PATTERN);
    }

    fn fire(&self, pattern: &[u32]) {
        if self.is_enabled() {
            self.device.vibrate(pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Vec<u32>>>);

    impl HapticPort for Recorder {
        fn vibrate(&self, pattern: &[u32]) {
            self.0.lock().unwrap().push(pattern.to_vec());
        }
    }

    #[test]
    fn fires_distinct_patterns() {
        let device = Arc::new(Recorder::default());
        let haptics = HapticService::new(device.clone(), true);
        haptics.press();
        haptics.alert_hazard();
        haptics.alert_hazard();
        let fired = device.0.lock().unwrap();
        assert_eq!(*fired, vec![vec![50], HAZARD_PATTERN.to_vec(), HAZARD_PATTERN.to_vec()]);
    }

    #[test]
    fn disabled_flag_silences_everything() {
        let device = Arc::new(Recorder::default());
        let haptics = HapticService::new(device.clone(), true);
        haptics.set_enabled(false);
        haptics.press();
        haptics.alert_hazard();
        assert!(device.0.lock().unwrap().is_empty());
    }
}
