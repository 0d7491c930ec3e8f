use std::fmt;

use thiserror::Error;

/// Colaborador externo cuya preparación se comprueba antes de arrancar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Camera,
    Model,
    Geolocation,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collaborator::Camera => "cámara",
            Collaborator::Model => "modelo de detección",
            Collaborator::Geolocation => "geolocalización",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
    #[error("No disponible: {0}")]
    NotReady(Collaborator),
    #[error("Clasificación fallida: {0}")]
    Classification(String),
    #[error("Almacenamiento: {0}")]
    Storage(String),
    #[error("Arranque cancelado por una parada")]
    Cancelled,
}

pub type DomainResult<T> = Result<T, DomainError>;
