use async_trait::async_trait;

use crate::application::ports::GeolocationPort;
use crate::domain::{
    errors::{Collaborator, DomainError, DomainResult},
    relay::GeoPosition,
};

/// Posición fija tomada de la configuración. Sin ella, la geolocalización no está disponible.
pub struct FixedGeolocation {
    position: Option<GeoPosition>,
}

impl FixedGeolocation {
    pub fn new(position: Option<GeoPosition>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationPort for FixedGeolocation {
    async fn current_position(&self) -> DomainResult<GeoPosition> {
        self.position.ok_or(DomainError::NotReady(Collaborator::Geolocation))
    }
}
