//! WebSocket session management for sequence replication.
//!
//! Each connected peer is a replica. A session pushes the current elements on
//! connect, applies every operation the peer sends to the hosted replica, and
//! forwards operations from everyone else back to the peer.

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use crate::crdt::{Element, Operation};
use crate::server::state::{AppState, Envelope};

type SocketSink = SplitSink<WebSocket, Message>;
type SessionResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Messages sent to peers
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Visible elements of the hosted replica with their identifiers, sent
    /// once on connect so the peer can seed its own replica
    Init { elements: Vec<Element> },
    /// An operation generated or relayed elsewhere
    Op { op: Operation },
}

/// WebSocket session manager
pub struct WebSocketSession {
    state: AppState,
    session_id: String,
}

impl WebSocketSession {
    /// Create a new WebSocket session
    pub fn new(state: AppState, session_id: String) -> Self {
        Self { state, session_id }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Handle the WebSocket connection lifecycle
    pub async fn handle(self, socket: WebSocket) {
        info!("WebSocket session {} established", self.session_id);

        let (mut sink, mut stream) = socket.split();

        let mut relay = match self.send_initial_state(&mut sink).await {
            Ok(relay) => relay,
            Err(e) => {
                error!("Failed to send initial state to {}: {}", self.session_id, e);
                return;
            }
        };

        loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => self.handle_text_message(&text).await,
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            error!("Failed to send pong to {}: {}", self.session_id, e);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket session {} closed by client", self.session_id);
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ignore other message types (binary, pong)
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", self.session_id, e);
                        break;
                    }
                },
                relayed = relay.recv() => match relayed {
                    Ok(envelope) => {
                        if let Err(e) = self.forward(&mut sink, envelope).await {
                            error!("Failed to forward operation to {}: {}", self.session_id, e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Session {} lagged, {} operations dropped", self.session_id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        info!("WebSocket session {} ended", self.session_id);
    }

    /// Sends the content snapshot and subscribes to the relay under the same
    /// read lock, so no operation falls between the two.
    async fn send_initial_state(
        &self,
        sink: &mut SocketSink,
    ) -> Result<broadcast::Receiver<Envelope>, Box<dyn std::error::Error + Send + Sync>> {
        let sequence = self.state.sequence.read().await;
        let relay = self.state.subscribe();
        let elements = sequence.snapshot();
        drop(sequence);

        send_message(sink, &ServerMessage::Init { elements }).await?;
        Ok(relay)
    }

    /// Applies an operation sent by the peer and relays it to everyone else.
    async fn handle_text_message(&self, text: &str) {
        debug!("Session {} received: {}", self.session_id, text);

        let op = match serde_json::from_str::<Operation>(text) {
            Ok(op) => op,
            Err(e) => {
                // Don't break connection for parse errors
                warn!("Failed to parse operation from {}: {}", self.session_id, e);
                return;
            }
        };

        let change = self.state.sequence.write().await.apply(&op);
        debug!(
            "Session {} applied {} ({})",
            self.session_id,
            op.kind(),
            if change.is_some() { "changed" } else { "no-op" }
        );
        self.state.relay(Some(self.session_id.clone()), op);
    }

    async fn forward(&self, sink: &mut SocketSink, envelope: Envelope) -> SessionResult {
        if envelope.origin.as_deref() == Some(self.session_id.as_str()) {
            return Ok(());
        }
        send_message(sink, &ServerMessage::Op { op: envelope.op }).await
    }
}

async fn send_message(sink: &mut SocketSink, message: &ServerMessage) -> SessionResult {
    let json = serde_json::to_string(message)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique session ID
pub fn generate_session_id() -> String {
    let n = SESSION_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    format!("session_{}_{}", Utc::now().timestamp_millis(), n)
}

/// Create and handle a new WebSocket session
pub async fn handle_websocket_connection(socket: WebSocket, state: AppState) {
    let session = WebSocketSession::new(state, generate_session_id());
    session.handle(socket).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::{Identifier, Position};

    #[test]
    fn test_session_ids_are_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert!(a.starts_with("session_"));
    }

    #[test]
    fn test_server_message_format() {
        let id = Identifier::new(Position::from_digits(vec![2, 2]), 4);
        let init = ServerMessage::Init {
            elements: vec![Element::new(id, "a")],
        };
        assert_eq!(
            serde_json::to_string(&init).unwrap(),
            r#"{"type":"init","elements":[{"id":{"position":[2,2],"counter":4},"value":"a"}]}"#
        );
    }
}
