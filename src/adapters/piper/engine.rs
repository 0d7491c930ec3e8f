use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::{watch, Notify};
use tracing::{error, info, warn};

use crate::application::ports::SpeechEnginePort;
use crate::domain::speech::{Utterance, Voice};

const DEFAULT_SAMPLE_RATE: u64 = 22050;

#[derive(Debug, Clone)]
pub struct PiperConfig {
    pub piper: PathBuf,
    pub voices_dir: PathBuf,
    /// Reproductor de PCM crudo (aplay).
    pub player: String,
}

struct Inner {
    config: PiperConfig,
    voices: Vec<Voice>,
    pending: Mutex<Option<Utterance>>,
    speaking: AtomicBool,
    wake: Notify,
    cancel: watch::Sender<u64>,
}

/// Motor de voz local: Piper sintetiza PCM y el reproductor lo saca por el altavoz.
/// Una sola locución suena a la vez y hay un único hueco pendiente.
pub struct PiperSpeechEngine {
    inner: Arc<Inner>,
}

impl PiperSpeechEngine {
    /// Debe llamarse dentro del runtime de tokio: lanza la tarea que reproduce.
    pub fn new(config: PiperConfig) -> Self {
        let voices = scan_voices(&config.voices_dir);
        if voices.is_empty() {
            warn!("⚠️ No hay voces de Piper en {}", config.voices_dir.display());
        } else {
            info!("🎙️ {} voces de Piper disponibles.", voices.len());
        }

        let (cancel, _) = watch::channel(0u64);
        let inner = Arc::new(Inner {
            config,
            voices,
            pending: Mutex::new(None),
            speaking: AtomicBool::new(false),
            wake: Notify::new(),
            cancel,
        });
        tokio::spawn(worker(Arc::clone(&inner)));
        Self { inner }
    }
}

async fn worker(inner: Arc<Inner>) {
    let mut cancel_rx = inner.cancel.subscribe();
    loop {
        // Marcar las cancelaciones previas antes de sacar la siguiente locución.
        cancel_rx.borrow_and_update();
        let next = inner.pending.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(utterance) = next else {
            inner.wake.notified().await;
            continue;
        };

        inner.speaking.store(true, Ordering::Release);
        tokio::select! {
            played = play(&inner, &utterance) => {
                if let Err(e) = played {
                    error!("❌ Piper: {e:#}");
                }
            }
            _ = cancel_rx.changed() => {
                info!("🔇 Locución cancelada.");
            }
        }
        inner.speaking.store(false, Ordering::Release);
    }
}

async fn play(inner: &Inner, utterance: &Utterance) -> Result<()> {
    let voice = utterance
        .voice
        .clone()
        .or_else(|| inner.voices.first().cloned())
        .ok_or_else(|| anyhow!("no hay ninguna voz instalada"))?;
    let sample_rate = sample_rate_for(Path::new(&voice.id));
    let length_scale = format!("{:.2}", 1.0 / utterance.rate.max(0.1));
    let rate = sample_rate.to_string();

    let mut piper = Command::new(&inner.config.piper)
        .args(["--model", voice.id.as_str(), "--output_raw", "--length_scale", length_scale.as_str()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("no se pudo lanzar {}", inner.config.piper.display()))?;

    let mut player = Command::new(&inner.config.player)
        .args(["-q", "-r", rate.as_str(), "-f", "S16_LE", "-t", "raw", "-c", "1"])
        .stdin(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("no se pudo lanzar {}", inner.config.player))?;

    let mut text_in = piper.stdin.take().ok_or_else(|| anyhow!("piper sin stdin"))?;
    text_in.write_all(utterance.text.as_bytes()).await?;
    text_in.write_all(b"\n").await?;
    drop(text_in);

    let mut pcm = piper.stdout.take().ok_or_else(|| anyhow!("piper sin stdout"))?;
    let mut audio_out = player.stdin.take().ok_or_else(|| anyhow!("reproductor sin stdin"))?;

    let mut buf = vec![0u8; 8192];
    let mut carry = None;
    loop {
        let n = pcm.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let scaled = scale_pcm(&buf[..n], utterance.volume, &mut carry);
        audio_out.write_all(&scaled).await?;
    }
    drop(audio_out);

    piper.wait().await?;
    player.wait().await?;
    Ok(())
}

/// Aplica el volumen a PCM S16_LE. Un byte suelto al final del bloque se
/// guarda en `carry` para el siguiente.
fn scale_pcm(chunk: &[u8], volume: f32, carry: &mut Option<u8>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(chunk.len() + 1);
    bytes.extend(carry.take());
    bytes.extend_from_slice(chunk);
    if bytes.len() % 2 == 1 {
        *carry = bytes.pop();
    }

    let volume = volume.clamp(0.0, 1.0);
    if volume < 1.0 {
        for sample in bytes.chunks_exact_mut(2) {
            let v = i16::from_le_bytes([sample[0], sample[1]]) as f32 * volume;
            sample.copy_from_slice(&(v as i16).to_le_bytes());
        }
    }
    bytes
}

/// Piper acompaña cada modelo con `<modelo>.onnx.json`, que incluye la frecuencia de muestreo.
fn sample_rate_for(model: &Path) -> u64 {
    let mut json_path = model.as_os_str().to_owned();
    json_path.push(".json");
    fs::read_to_string(json_path)
        .ok()
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
        .and_then(|v| v["audio"]["sample_rate"].as_u64())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// `en_US-lessac-medium.onnx` -> voz "en_US-lessac-medium" en "en-US".
fn voice_from_path(path: &Path) -> Option<Voice> {
    if path.extension()? != "onnx" {
        return None;
    }
    let name = path.file_stem()?.to_str()?.to_string();
    let language = name.split('-').next()?.replace('_', "-");
    Some(Voice {
        id: path.to_string_lossy().into_owned(),
        name,
        language,
    })
}

fn scan_voices(dir: &Path) -> Vec<Voice> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut voices: Vec<Voice> = entries
        .flatten()
        .filter_map(|e| voice_from_path(&e.path()))
        .collect();
    voices.sort_by(|a, b| a.name.cmp(&b.name));
    voices
}

impl SpeechEnginePort for PiperSpeechEngine {
    fn voices(&self) -> Vec<Voice> {
        self.inner.voices.clone()
    }

    fn is_speaking(&self) -> bool {
        self.inner.speaking.load(Ordering::Acquire)
    }

    fn speak(&self, utterance: Utterance) {
        let replaced = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(utterance);
        if replaced.is_some() {
            info!("⏭️ Locución pendiente sustituida.");
        }
        self.inner.wake.notify_one();
    }

    fn cancel(&self) {
        self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.inner.cancel.send_modify(|epoch| *epoch += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_language_comes_from_file_name() {
        let voice = voice_from_path(Path::new("/voices/en_US-lessac-medium.onnx")).unwrap();
        assert_eq!(voice.name, "en_US-lessac-medium");
        assert_eq!(voice.language, "en-US");
        assert_eq!(voice.id, "/voices/en_US-lessac-medium.onnx");
        assert!(voice_from_path(Path::new("/voices/en_US-lessac-medium.onnx.json")).is_none());
    }

    #[test]
    fn scan_finds_only_onnx_models() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["es_ES-davefx-medium.onnx", "en_GB-alan-low.onnx", "en_GB-alan-low.onnx.json", "README.md"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let names: Vec<String> = scan_voices(dir.path()).into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["en_GB-alan-low", "es_ES-davefx-medium"]);
    }

    #[test]
    fn sample_rate_is_read_from_model_config() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("en_US-amy-low.onnx");
        assert_eq!(sample_rate_for(&model), DEFAULT_SAMPLE_RATE);
        fs::write(dir.path().join("en_US-amy-low.onnx.json"), r#"{"audio": {"sample_rate": 16000}}"#).unwrap();
        assert_eq!(sample_rate_for(&model), 16000);
    }

    #[test]
    fn half_volume_halves_samples() {
        let mut carry = None;
        let out = scale_pcm(&[0x00, 0x10, 0x00, 0xF0], 0.5, &mut carry);
        assert_eq!(out, vec![0x00, 0x08, 0x00, 0xF8]);
        assert!(carry.is_none());
    }

    #[test]
    fn odd_byte_is_carried_to_next_chunk() {
        let mut carry = None;
        let first = scale_pcm(&[0x01, 0x02, 0x03], 1.0, &mut carry);
        assert_eq!(first, vec![0x01, 0x02]);
        assert_eq!(carry, Some(0x03));
        let second = scale_pcm(&[0x04], 1.0, &mut carry);
        assert_eq!(second, vec![0x03, 0x04]);
        assert!(carry.is_none());
    }
}
