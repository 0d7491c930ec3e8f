use serde::{Deserialize, Serialize};

use crate::domain::camera::CameraFacing;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub phrase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Frase registrada que se ejecutó, si alguna coincidió.
    pub matched: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    /// URI `tel:` que marca el dispositivo del usuario.
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSwitchResponse {
    pub facing: CameraFacing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceCommandsResponse {
    pub listening: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSettingsResponse {
    pub ok: bool,
    pub persisted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self { error: error.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
