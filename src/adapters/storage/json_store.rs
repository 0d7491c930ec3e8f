use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::application::ports::SettingsPort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    settings::Settings,
};

/// Ajustes en un fichero JSON. Escribe en un temporal y lo renombra para
/// no dejar el fichero a medias.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> DomainResult<Option<Settings>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DomainError::Storage(e.to_string())),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DomainError::Storage(format!("{}: {e}", self.path.display())))
    }

    fn write(&self, settings: &Settings) -> DomainResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| DomainError::Storage(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(settings).map_err(|e| DomainError::Storage(e.to_string()))?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).map_err(|e| DomainError::Storage(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| DomainError::Storage(e.to_string()))
    }
}

impl SettingsPort for JsonSettingsStore {
    fn load(&self) -> Settings {
        match self.read() {
            Ok(Some(settings)) => {
                info!("⚙️ Ajustes cargados desde {}", self.path.display());
                settings
            }
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("⚠️ Ajustes ilegibles, se usan los valores por defecto: {e}");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> bool {
        match self.write(settings) {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ {e}");
                false
            }
        }
    }

    fn clear(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!("⚠️ No se pudieron borrar los ajustes: {e}");
                false
            }
        }
    }
}
