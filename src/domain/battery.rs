#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// Nivel de carga entre 0 y 1.
    pub level: f32,
    pub charging: bool,
}

pub fn status_text(reading: Option<BatteryReading>) -> String {
    match reading {
        None => "Battery status unavailable".to_string(),
        Some(r) => {
            let percentage = (r.level * 100.0).round() as u32;
            let charging = if r.charging { "charging" } else { "not charging" };
            format!("Battery at {percentage}% and {charging}")
        }
    }
}

/// Avisos de batería baja al cruzar 20 %, 10 % y 5 %, una vez por cada descenso.
#[derive(Debug, Clone)]
pub struct BatteryAlerts {
    last_alert_level: f32,
}

impl Default for BatteryAlerts {
    fn default() -> Self {
        Self { last_alert_level: 1.0 }
    }
}

impl BatteryAlerts {
    pub fn check(&mut self, level: f32) -> Option<&'static str> {
        // Tras cargar, los umbrales se rearman.
        if level > self.last_alert_level {
            self.last_alert_level = level;
            return None;
        }

        let message = if level <= 0.05 && self.last_alert_level > 0.05 {
            "Critical battery level. 5% remaining."
        } else if level <= 0.1 && self.last_alert_level > 0.1 {
            "Low battery. 10% remaining."
        } else if level <= 0.2 && self.last_alert_level > 0.2 {
            "Battery at 20%. Please charge soon."
        } else {
            return None;
        };
        self.last_alert_level = level;
        Some(message)
    }
}
