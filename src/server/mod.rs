//! Relay server module for the replicated sequence.
//!
//! This module contains the Axum web server that hosts one replica, exposes
//! index-based edits over HTTP and relays operations between WebSocket peers.

pub mod routes;
pub mod state;
pub mod websocket;

// Re-export main server functionality
pub use routes::create_router;
pub use state::{AppState, Envelope, RelayUpstream};
pub use websocket::{ServerMessage, WebSocketSession};
