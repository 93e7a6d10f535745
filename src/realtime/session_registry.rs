use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::LivePush;
use crate::models::alert::PushPayload;

/// Eventos pendientes por sesión antes de considerarla atascada
pub const SESSION_BUFFER: usize = 64;

type Sessions = HashMap<i32, HashMap<Uuid, mpsc::Sender<String>>>;

/// Sesiones websocket abiertas, agrupadas por usuario
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<Sessions>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una sesión y devuelve su id y el receptor de eventos
    pub async fn register(&self, usuario_id: i32) -> (Uuid, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        let session_id = Uuid::new_v4();

        let mut sessions = self.sessions.write().await;
        sessions.entry(usuario_id).or_default().insert(session_id, tx);
        info!(usuario_id, %session_id, "🔌 Sesión websocket registrada");

        (session_id, rx)
    }

    pub async fn unregister(&self, usuario_id: i32, session_id: Uuid) {
        let mut sessions = self.sessions.write().await;
        if let Some(user_sessions) = sessions.get_mut(&usuario_id) {
            user_sessions.remove(&session_id);
            if user_sessions.is_empty() {
                sessions.remove(&usuario_id);
            }
        }
        info!(usuario_id, %session_id, "🔌 Sesión websocket cerrada");
    }

    pub async fn session_count(&self, usuario_id: i32) -> usize {
        self.sessions
            .read()
            .await
            .get(&usuario_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl LivePush for SessionRegistry {
    async fn emit(&self, usuario_id: i32, payload: &PushPayload) -> Result<usize, serde_json::Error> {
        let message = serde_json::to_string(payload)?;

        let mut sessions = self.sessions.write().await;
        let Some(user_sessions) = sessions.get_mut(&usuario_id) else {
            debug!(usuario_id, "Usuario sin sesiones activas, push omitido");
            return Ok(0);
        };

        // Cerrada: el socket terminó. Llena: el cliente dejó de leer
        user_sessions.retain(|session_id, tx| match tx.try_send(message.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(usuario_id, %session_id, "⚠️ Sesión sin leer eventos, se descarta");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        let delivered = user_sessions.len();
        if user_sessions.is_empty() {
            sessions.remove(&usuario_id);
        }

        Ok(delivered)
    }
}
