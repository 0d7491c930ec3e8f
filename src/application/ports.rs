use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::domain::{
    battery::BatteryReading,
    camera::{CameraFacing, Frame},
    detection::Detection,
    errors::DomainResult,
    relay::{GeoPosition, RelayEvent},
    settings::Settings,
    speech::{Utterance, Voice},
    stream::DisplayEvent,
};

#[async_trait]
pub trait CameraPort: Send + Sync {
    /// Abre el stream de la orientación pedida. `true` cuando ya entrega frames.
    async fn acquire(&self, facing: CameraFacing) -> bool;
    /// Frame más reciente de la superficie de vídeo, si lo hay.
    fn current_frame(&self) -> Option<Arc<Frame>>;
    /// Libera el stream. Sin efecto si no hay ninguno abierto.
    fn release(&self);
}

#[async_trait]
pub trait ObjectModelPort: Send + Sync {
    async fn load(&self) -> DomainResult<()>;
    /// Detecciones en bruto, sin filtrar por el umbral de confianza del usuario.
    async fn detect(&self, frame: Arc<Frame>) -> DomainResult<Vec<Detection>>;
}

/// Reloj de refresco: cada suscripción recibe un instante por tick.
/// Soltar el receptor cancela la suscripción.
pub trait RefreshClock: Send + Sync {
    fn subscribe(&self) -> mpsc::Receiver<Instant>;
}

/// Motor de síntesis de voz.
///
/// `speak` no bloquea. Si ya hay una locución sonando, la nueva espera en un
/// único hueco pendiente que sustituye a cualquier otra pendiente.
pub trait SpeechEnginePort: Send + Sync {
    fn voices(&self) -> Vec<Voice>;
    fn is_speaking(&self) -> bool;
    fn speak(&self, utterance: Utterance);
    fn cancel(&self);
}

pub trait HapticPort: Send + Sync {
    /// Patrón en milisegundos alternando vibración y pausa.
    fn vibrate(&self, pattern: &[u32]);
}

pub trait DisplayPort: Send + Sync {
    fn publish(&self, event: DisplayEvent);
}

pub trait SettingsPort: Send + Sync {
    /// Devuelve los valores por defecto si no hay nada guardado o está corrupto.
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> bool;
    fn clear(&self) -> bool;
}

#[async_trait]
pub trait GeolocationPort: Send + Sync {
    async fn current_position(&self) -> DomainResult<GeoPosition>;
}

pub trait RelayPort: Send + Sync {
    fn publish(&self, event: &RelayEvent);
}

pub trait BatteryPort: Send + Sync {
    fn read(&self) -> Option<BatteryReading>;
}
