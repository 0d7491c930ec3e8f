use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

pub type CommandAction = Arc<dyn Fn() + Send + Sync>;

/// Registro de órdenes de voz: frase → acción sin argumentos.
#[derive(Default)]
pub struct VoiceCommands {
    commands: RwLock<BTreeMap<String, CommandAction>>,
}

impl VoiceCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, phrase: &str, action: CommandAction) {
        let phrase = normalize(phrase);
        self.commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(phrase, action);
    }

    pub fn phrases(&self) -> Vec<String> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Ejecuta la orden que corresponde a la transcripción y devuelve su frase.
    ///
    /// Gana la coincidencia exacta; si no la hay, la frase registrada más larga
    /// contenida en la transcripción.
    pub fn dispatch(&self, transcript: &str) -> Option<String> {
        let heard = normalize(transcript);
        let (phrase, action) = {
            let commands = self.commands.read().unwrap_or_else(PoisonError::into_inner);
            let found = commands.get_key_value(&heard).or_else(|| {
                commands
                    .iter()
                    .filter(|(phrase, _)| heard.contains(phrase.as_str()))
                    .max_by_key(|(phrase, _)| phrase.len())
            });
            match found {
                Some((phrase, action)) => (phrase.clone(), Arc::clone(action)),
                None => {
                    debug!("Orden no reconocida: {heard:?}");
                    return None;
                }
            }
        };
        info!("🗣️ Orden de voz: {phrase}");
        action();
        Some(phrase)
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
