//! WebSocket upgrade + message loop. Each client message is parsed as JSON
//! and dispatched to this connection's `ChatSession`; replies are pushed back
//! in order. One session per socket, so conversational state never leaks
//! between tabs.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::domain::Mode;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::ChatSession;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
  /// Initial mode; unrecognized values fall back to the assistant persona.
  pub mode: Option<String>,
}

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Query(q): Query<WsQuery>,
) -> impl IntoResponse {
  info!(target: "coursepilot_backend", "WebSocket upgrade requested");
  let mode = Mode::parse_or_assistant(q.mode.as_deref().unwrap_or_default());
  ws.on_upgrade(move |socket| handle_ws(socket, state, mode))
}

#[instrument(level = "info", skip(socket, state), fields(session = %Uuid::new_v4(), %mode))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, mode: Mode) {
  info!(target: "coursepilot_backend", "WebSocket connected");
  let mut session = ChatSession::with_mode(state, mode);

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize responses.
        let replies = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "chat", "WS received: {:?}", &incoming);
            session.handle(incoming).await
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        };

        for reply in replies {
          let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
            serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
          });

          if let Err(e) = socket.send(Message::Text(out)).await {
            error!(target: "coursepilot_backend", error = %e, "WS send error");
            return;
          }
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "coursepilot_backend", "WebSocket disconnected");
}
