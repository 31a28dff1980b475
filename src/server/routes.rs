//! Route handlers for the sequence relay server.
//!
//! This module contains all the HTTP route handlers and related types for the Axum server.

use axum::{
    Router,
    extract::{State, ws::WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::crdt::{Change, Operation, SiteId};
use crate::error::SequenceError;
use crate::server::state::AppState;
use crate::server::websocket::handle_websocket_connection;

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub site: SiteId,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ContentResponse {
    pub content: Vec<String>,
    pub size: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct InsertRequest {
    pub index: usize,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DeleteRequest {
    pub index: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MoveRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApplyResponse {
    pub change: Option<Change>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

/// A [`SequenceError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct AppError(pub SequenceError);

impl From<SequenceError> for AppError {
    fn from(err: SequenceError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            SequenceError::IndexOutOfRange { .. } => StatusCode::BAD_REQUEST,
            SequenceError::NoUpstream => StatusCode::SERVICE_UNAVAILABLE,
            SequenceError::NoPositionAvailable { .. } | SequenceError::NoEffect { .. } => {
                StatusCode::CONFLICT
            }
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Basic health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running!".to_string(),
        site: state.site,
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Current visible content of the hosted replica
pub async fn content(State(state): State<AppState>) -> Json<ContentResponse> {
    let sequence = state.sequence.read().await;
    Json(ContentResponse {
        content: sequence.content(),
        size: sequence.size(),
    })
}

pub async fn insert(
    State(state): State<AppState>,
    Json(request): Json<InsertRequest>,
) -> Result<Json<Operation>, AppError> {
    let op = state
        .sequence
        .write()
        .await
        .insert(request.index, request.content)?;
    info!(index = request.index, "inserted over http");
    Ok(Json(op))
}

pub async fn delete(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Operation>, AppError> {
    let op = state.sequence.write().await.delete(request.index)?;
    info!(index = request.index, "deleted over http");
    Ok(Json(op))
}

pub async fn move_element(
    State(state): State<AppState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Operation>, AppError> {
    let op = state
        .sequence
        .write()
        .await
        .move_element(request.from, request.to)?;
    info!(from = request.from, to = request.to, "moved over http");
    Ok(Json(op))
}

/// Applies an operation generated by another replica and relays it to sessions
pub async fn apply_op(
    State(state): State<AppState>,
    Json(op): Json<Operation>,
) -> Json<ApplyResponse> {
    let change = state.sequence.write().await.apply(&op);
    if change.is_none() {
        warn!(kind = op.kind(), "remote operation had no effect");
    }
    state.relay(None, op);
    Json(ApplyResponse { change })
}

/// WebSocket connection handler for collaborative editing
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, state))
}

/// Creates and configures the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/content", get(content))
        .route("/insert", post(insert))
        .route("/delete", post(delete))
        .route("/move", post(move_element))
        .route("/ops", post(apply_op))
        .route("/ws", get(ws_handler))
        .with_state(state)
}
