use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use tracing::{info, warn};

use crate::application::ports::{GeolocationPort, RelayPort};
use crate::domain::relay::{GeoPosition, RelayEvent};

pub const LOCATION_UNAVAILABLE: &str = "Location unavailable";

pub struct LocationService {
    geolocation: Arc<dyn GeolocationPort>,
    relay: Arc<dyn RelayPort>,
    current: RwLock<Option<GeoPosition>>,
    enabled: AtomicBool,
}

impl LocationService {
    pub fn new(geolocation: Arc<dyn GeolocationPort>, relay: Arc<dyn RelayPort>) -> Self {
        Self {
            geolocation,
            relay,
            current: RwLock::new(None),
            enabled: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Pide la posición actual y deja el seguimiento activo si hay respuesta.
    pub async fn enable_tracking(&self) -> bool {
        match self.geolocation.current_position().await {
            Ok(position) => {
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(position);
                self.enabled.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                warn!("📍 No se pudo obtener la ubicación: {e}");
                self.enabled.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Con el seguimiento activo vuelve a consultar la posición; si la consulta
    /// falla se conserva la última conocida.
    pub async fn refresh(&self) -> Option<GeoPosition> {
        if self.is_enabled() {
            match self.geolocation.current_position().await {
                Ok(position) => {
                    *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(position);
                }
                Err(e) => warn!("📍 Sin posición nueva, se mantiene la última: {e}"),
            }
        }
        self.position()
    }

    pub fn disable_tracking(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn position(&self) -> Option<GeoPosition> {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn location_string(&self) -> String {
        match self.position() {
            Some(p) => format!("{:.6}, {:.6}", p.latitude, p.longitude),
            None => LOCATION_UNAVAILABLE.to_string(),
        }
    }

    /// Publica la posición para los contactos conectados al relay.
    pub async fn share_location(&self) -> String {
        let Some(position) = self.refresh().await else {
            return LOCATION_UNAVAILABLE.to_string();
        };
        self.relay.publish(&RelayEvent::location_update(position, Utc::now()));
        info!("📍 Ubicación compartida: {}", position.maps_url());
        "Location shared successfully".to_string()
    }

    pub async fn send_emergency_alert(&self) -> bool {
        let Some(position) = self.refresh().await else {
            return false;
        };
        self.relay.publish(&RelayEvent::emergency_alert(position, Utc::now()));
        warn!("🚨 Alerta de emergencia enviada desde {}", position.maps_url());
        true
    }
}
