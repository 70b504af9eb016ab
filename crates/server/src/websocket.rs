//! WebSocket surface
//!
//! Realtime streaming transcription. The listener is a second router bound
//! to HTTP port + 1000 that only knows `<prefix>/hot_stream`; any other path
//! is rejected at the handshake. Binary frames carry raw 16-bit LE PCM at
//! 16 kHz mono, text frames carry JSON control messages, and the server
//! replies with JSON text frames only.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;

use murmur_audio::pcm16_frame_to_f32;

use crate::session::Session;
use crate::state::AppState;
use crate::stream;

/// Create the WebSocket router served on HTTP port + 1000.
pub fn create_ws_router(state: AppState) -> Router {
    let prefix = state.settings.server.request_path.clone();
    Router::new()
        .route(&format!("{prefix}/hot_stream"), get(upgrade))
        .with_state(state)
}

/// Handshake gate: admit the connection only while the registry has
/// capacity. Other paths never reach here; the router 404s them.
async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    if !state.sessions.has_capacity() {
        tracing::warn!("rejecting WebSocket handshake: session limit reached");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut source) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    let Some(session) = state.sessions.insert(outbound_tx) else {
        // lost the capacity race between handshake and upgrade
        let _ = sink.send(Message::Close(None)).await;
        return;
    };

    tracing::info!(session = %session.id, "WebSocket connection accepted");

    // Writer task: the only place that touches the sink, so no registry or
    // ring lock is ever held across a socket write.
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    while let Some(incoming) = source.next().await {
        let msg = match incoming {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "WebSocket receive error");
                break;
            }
        };

        match msg {
            Message::Binary(payload) => {
                session.touch();
                handle_audio_frame(&state, &session, &payload).await;
            }
            Message::Text(text) => {
                session.touch();
                handle_control_message(&session, &text);
            }
            Message::Close(frame) => {
                let (code, reason) = frame
                    .map(|f| (u16::from(f.code), f.reason.into_owned()))
                    .unwrap_or((1005, String::new()));
                tracing::info!(session = %session.id, code, reason = %reason, "connection closed");
                break;
            }
            // axum answers pings at the protocol layer
            _ => {}
        }
    }

    state.sessions.remove(session.id);
    writer.abort();
}

/// Append one binary frame to the session ring and run the trigger
/// predicate. Frames that do not decode are skipped with the ring untouched.
async fn handle_audio_frame(state: &AppState, session: &Session, payload: &[u8]) {
    let Some(samples) = pcm16_frame_to_f32(payload) else {
        tracing::debug!(session = %session.id, len = payload.len(), "skipping undecodable frame");
        return;
    };
    if samples.is_empty() {
        return;
    }

    session.ring.lock().push(&samples);

    if let Some(text) = stream::realtime_pass(state, session).await {
        let body = json!({
            "text": text,
            "timestamp": epoch_millis(),
            "is_streaming": true,
        });
        session.send_text(body.to_string());
    }
}

/// Interpret a text frame as a JSON control message. A ping elicits a pong;
/// every other control message is accepted but unreplied.
fn handle_control_message(session: &Session, text: &str) {
    let parsed: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(session = %session.id, error = %e, "invalid control message");
            return;
        }
    };

    if parsed.get("type").and_then(|t| t.as_str()) == Some("ping") {
        session.send_text(json!({ "type": "pong" }).to_string());
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::SessionRegistry;

    fn test_session() -> (std::sync::Arc<Session>, mpsc::UnboundedReceiver<Message>) {
        let registry = SessionRegistry::new(10, Duration::from_secs(60));
        let (tx, rx) = mpsc::unbounded_channel();
        (registry.insert(tx).unwrap(), rx)
    }

    #[test]
    fn test_ping_elicits_pong() {
        let (session, mut rx) = test_session();
        handle_control_message(&session, r#"{"type":"ping"}"#);

        let Ok(Message::Text(body)) = rx.try_recv() else {
            panic!("expected a text frame");
        };
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["type"], "pong");
    }

    #[test]
    fn test_other_control_messages_unreplied() {
        let (session, mut rx) = test_session();
        handle_control_message(&session, r#"{"type":"configure","rate":16000}"#);
        handle_control_message(&session, "not json at all");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_epoch_millis_monotonic_enough() {
        let a = epoch_millis();
        assert!(a > 1_600_000_000_000);
    }
}
