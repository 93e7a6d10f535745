//! Notificaciones en tiempo real
//!
//! Registro de sesiones websocket por usuario y canal de push usado por el
//! fan-out de alertas.

pub mod session_registry;

use async_trait::async_trait;

use crate::models::alert::PushPayload;

pub use session_registry::SessionRegistry;

/// Canal de push a las sesiones en vivo de un usuario
#[async_trait]
pub trait LivePush: Send + Sync {
    /// Devuelve cuántas sesiones recibieron el evento; 0 si el usuario no
    /// tiene sesiones conectadas (no es un error)
    async fn emit(&self, usuario_id: i32, payload: &PushPayload) -> Result<usize, serde_json::Error>;
}
