//! Websocket de alertas en vivo
//!
//! Cada conexión se registra en `SessionRegistry` bajo su usuario; el
//! registro reenvía por aquí los eventos del fan-out. Los mensajes del
//! cliente se ignoran salvo el cierre.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::realtime::SessionRegistry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub usuario_id: i32,
}

pub fn create_ws_router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Response {
    let sessions = state.sessions.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, params.usuario_id, sessions))
}

async fn handle_socket(socket: WebSocket, usuario_id: i32, sessions: SessionRegistry) {
    let (session_id, mut events) = sessions.register(usuario_id).await;
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if sender.send(Message::Text(event)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Close(frame)) => {
                    debug!(usuario_id, ?frame, "Cliente cerró el websocket");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(usuario_id, "⚠️ Error en websocket: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    sessions.unregister(usuario_id, session_id).await;
}
