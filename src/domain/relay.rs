use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn maps_url(&self) -> String {
        format!("https://maps.google.com/?q={},{}", self.latitude, self.longitude)
    }
}

/// Eventos que el relay reparte entre los clientes conectados.
/// Formato en el cable: `{"event": "emergency_alert", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RelayEvent {
    EmergencyAlert {
        location: GeoPosition,
        timestamp: String,
    },
    LocationUpdate {
        latitude: f64,
        longitude: f64,
        timestamp: String,
    },
}

impl RelayEvent {
    pub fn emergency_alert(location: GeoPosition, at: DateTime<Utc>) -> Self {
        RelayEvent::EmergencyAlert {
            location,
            timestamp: wire_timestamp(at),
        }
    }

    pub fn location_update(position: GeoPosition, at: DateTime<Utc>) -> Self {
        RelayEvent::LocationUpdate {
            latitude: position.latitude,
            longitude: position.longitude,
            timestamp: wire_timestamp(at),
        }
    }
}

/// RFC 3339 en UTC con milisegundos, p. ej. `2024-05-01T10:00:00.000Z`.
pub fn wire_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
