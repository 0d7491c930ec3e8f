pub mod display;
pub mod relay;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{routing::{get, post}, Router};
use crate::adapters::http::relay::relay_handler;
use crate::adapters::http::state::HttpState;
use crate::adapters::http::ws::ws_handler;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/start", post(routes::start))
        .route("/api/stop", post(routes::stop))
        .route("/api/command", post(routes::command))
        .route("/api/voice-commands", post(routes::toggle_voice_commands))
        .route("/api/settings", get(routes::get_settings).post(routes::save_settings))
        .route("/api/camera/switch", post(routes::switch_camera))
        .route("/api/emergency", post(routes::emergency))
        .route("/api/emergency/share", post(routes::share_emergency_location))
        .route("/api/emergency/dismiss", post(routes::dismiss_emergency))
        .route("/api/emergency/call", post(routes::call_contact))
        .route("/api/status", get(routes::status))
        .route("/ws/stream", get(ws_handler))
        .route("/ws/relay", get(relay_handler))
        .with_state(state)
}
