use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use crate::adapters::http::state::HttpState;
use crate::application::ports::RelayPort;
use crate::domain::relay::RelayEvent;

/// Emisor de los eventos publicados por el propio asistente.
pub const LOCAL_PEER: u64 = 0;

#[derive(Debug, Clone)]
pub struct RelayFrame {
    pub from: u64,
    pub text: String,
}

/// Relay sin estado: cada texto recibido se reenvía tal cual al resto de pares.
pub struct RelayHub {
    tx: broadcast::Sender<RelayFrame>,
    next_peer: AtomicU64,
}

impl RelayHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            next_peer: AtomicU64::new(LOCAL_PEER + 1),
        }
    }

    /// Registra un par nuevo y devuelve su identificador y su receptor.
    pub fn connect(&self) -> (u64, broadcast::Receiver<RelayFrame>) {
        let id = self.next_peer.fetch_add(1, Ordering::Relaxed);
        (id, self.tx.subscribe())
    }

    pub fn forward(&self, from: u64, text: String) {
        let _ = self.tx.send(RelayFrame { from, text });
    }
}

impl RelayPort for RelayHub {
    fn publish(&self, event: &RelayEvent) {
        match serde_json::to_string(event) {
            Ok(json) => self.forward(LOCAL_PEER, json),
            Err(e) => warn!("⚠️ Evento de relay no serializable: {e}"),
        }
    }
}

pub async fn relay_handler(ws: WebSocketUpgrade, State(st): State<HttpState>) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_peer(socket, st))
}

async fn handle_peer(mut socket: WebSocket, st: HttpState) {
    let (id, mut rx) = st.relay.connect();
    info!("🔗 Par {id} conectado al relay.");

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => st.relay.forward(id, text.to_string()),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            frame = rx.recv() => match frame {
                Ok(frame) if frame.from == id => {}
                Ok(frame) => {
                    if socket.send(Message::Text(frame.text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => warn!("⚠️ Par {id} perdió {n} eventos del relay."),
                Err(RecvError::Closed) => break,
            },
        }
    }
    info!("🔗 Par {id} desconectado del relay.");
}
