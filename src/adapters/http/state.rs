use std::sync::Arc;

use crate::adapters::http::{display::BroadcastDisplay, relay::RelayHub};
use crate::application::services::AssistantService;

/// Estado compartido para los manejadores HTTP de Axum.
#[derive(Clone)]
pub struct HttpState {
    /// Coordinador de las acciones del usuario.
    pub assistant: Arc<AssistantService>,
    /// Origen de los eventos de `/ws/stream`.
    pub display: Arc<BroadcastDisplay>,
    pub relay: Arc<RelayHub>,
}
