use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    /// Interrumpe lo que se esté diciendo y se salta el intervalo mínimo.
    pub priority: bool,
}

impl SpeechRequest {
    pub fn normal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: false,
        }
    }

    pub fn priority(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    /// Identificador propio del motor (para Piper, la ruta del modelo).
    pub id: String,
    pub name: String,
    /// Etiqueta BCP 47, p. ej. "en-US".
    pub language: String,
}

/// Petición ya renderizada con los ajustes vigentes en el momento del envío.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub volume: f32,
    pub language: String,
    pub voice: Option<Voice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechOutcome {
    Spoken,
    /// Prioritaria: se canceló una locución en curso.
    Preempted,
    /// Descartada por el intervalo mínimo. No es un error.
    Dropped,
    /// Texto vacío.
    Ignored,
}
