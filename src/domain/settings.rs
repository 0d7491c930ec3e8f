use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub rate: f32,
    pub volume: f32,
    pub language: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            volume: 1.0,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
}

impl EmergencyContact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

/// Preferencias del usuario. Se guardan en JSON con claves camelCase; los
/// campos ausentes toman su valor por defecto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub speech: SpeechSettings,
    pub detection_threshold: f32,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub haptic_feedback: bool,
    pub high_contrast: bool,
    pub battery_alerts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speech: SpeechSettings::default(),
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            emergency_contacts: vec![EmergencyContact::new("Emergency Services", "911")],
            haptic_feedback: true,
            high_contrast: false,
            battery_alerts: true,
        }
    }
}
