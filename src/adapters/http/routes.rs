use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use tracing::warn;

use crate::adapters::http::state::HttpState;
use crate::application::dto::{
    CallRequest, CallResponse, CameraSwitchResponse, CommandRequest, CommandResponse, ErrorResponse, MessageResponse, OkResponse,
    SaveSettingsResponse, VoiceCommandsResponse,
};
use crate::domain::{errors::DomainError, settings::Settings};

fn error_response(e: DomainError) -> Response {
    let status = match &e {
        DomainError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::Cancelled => StatusCode::CONFLICT,
        DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(e))).into_response()
}

pub async fn start(State(st): State<HttpState>) -> Response {
    match st.assistant.start().await {
        Ok(()) => Json(OkResponse { ok: true }).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn stop(State(st): State<HttpState>) -> impl IntoResponse {
    st.assistant.stop();
    Json(OkResponse { ok: true })
}

pub async fn command(State(st): State<HttpState>, Json(req): Json<CommandRequest>) -> impl IntoResponse {
    let matched = st.assistant.handle_command(&req.phrase);
    if matched.is_none() {
        warn!("🗣️ Orden no reconocida: {:?}", req.phrase);
    }
    Json(CommandResponse { matched })
}

pub async fn toggle_voice_commands(State(st): State<HttpState>) -> impl IntoResponse {
    let listening = st.assistant.toggle_voice_commands();
    Json(VoiceCommandsResponse { listening })
}

pub async fn get_settings(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.assistant.open_settings())
}

pub async fn save_settings(State(st): State<HttpState>, Json(settings): Json<Settings>) -> impl IntoResponse {
    let persisted = st.assistant.save_settings(settings);
    Json(SaveSettingsResponse { ok: true, persisted })
}

pub async fn switch_camera(State(st): State<HttpState>) -> Response {
    match st.assistant.switch_camera().await {
        Ok(facing) => Json(CameraSwitchResponse { facing }).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn emergency(State(st): State<HttpState>) -> impl IntoResponse {
    st.assistant.emergency();
    Json(OkResponse { ok: true })
}

pub async fn dismiss_emergency(State(st): State<HttpState>) -> impl IntoResponse {
    st.assistant.dismiss_emergency();
    Json(OkResponse { ok: true })
}

pub async fn call_contact(State(st): State<HttpState>, Json(req): Json<CallRequest>) -> Response {
    match st.assistant.call_contact(req.index) {
        Ok(uri) => Json(CallResponse { uri }).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn share_emergency_location(State(st): State<HttpState>) -> impl IntoResponse {
    let message = st.assistant.share_emergency_location().await;
    Json(MessageResponse { message })
}

pub async fn status(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.assistant.status().await)
}
