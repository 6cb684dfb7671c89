//! HTTP + WebSocket presentation layer
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /state - Current snapshot
//! - POST /message - Replace the message text
//! - POST /transmit - Encode and transmit the message
//! - POST /stop - Stop the current transmission
//! - POST /shake - Raw shake event (debounced)
//! - WS /ws - Live state updates

use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use crate::core::{Communicator, ShakeDetector};
use crate::error::Result;
use crate::types::StateUpdate;

/// App state
pub struct AppState {
    pub communicator: Arc<Communicator>,
    pub shake: ShakeDetector,
}

/// Replace message request
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Shake response
#[derive(Debug, Serialize)]
pub struct ShakeResponse {
    pub accepted: bool,
    pub update: StateUpdate,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub phase: String,
}

/// Create the API router
pub fn create_router(communicator: Arc<Communicator>) -> Router {
    let restore = Arc::clone(&communicator);
    let shake = ShakeDetector::new(communicator.config().shake_cooldown(), move || {
        restore.restore_sanity();
    });
    shake.start();

    let state = Arc::new(AppState { communicator, shake });

    Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/message", post(update_message))
        .route("/transmit", post(transmit))
        .route("/stop", post(stop))
        .route("/shake", post(shake_event))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        phase: state.communicator.snapshot().phase().to_string(),
    })
}

async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateUpdate> {
    Json(state.communicator.current())
}

async fn update_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MessageRequest>,
) -> Json<StateUpdate> {
    state.communicator.update_message(req.text);
    Json(state.communicator.current())
}

async fn transmit(State(state): State<Arc<AppState>>) -> Json<StateUpdate> {
    state.communicator.encode_and_transmit();
    Json(state.communicator.current())
}

async fn stop(State(state): State<Arc<AppState>>) -> Json<StateUpdate> {
    state.communicator.stop_transmission();
    Json(state.communicator.current())
}

async fn shake_event(State(state): State<Arc<AppState>>) -> Json<ShakeResponse> {
    let accepted = state.shake.shake_now();
    Json(ShakeResponse {
        accepted,
        update: state.communicator.current(),
    })
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.communicator.subscribe();
    let first = state.communicator.current();
    ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, first, rx).await;
    })
}

/// Send the current state, then every update after it, until the client leaves
async fn handle_websocket(
    socket: WebSocket,
    first: StateUpdate,
    mut rx: broadcast::Receiver<StateUpdate>,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut last_revision = first.revision;
    if sender.send(to_message(&first)).await.is_err() {
        return;
    }
    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(update) => {
                    if update.revision <= last_revision {
                        continue;
                    }
                    last_revision = update.revision;
                    if sender.send(to_message(&update)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

fn to_message(update: &StateUpdate) -> Message {
    Message::Text(serde_json::to_string(update).unwrap_or_default())
}

/// Run the API server until Ctrl-C
pub async fn run_server(addr: &str, communicator: Arc<Communicator>) -> Result<()> {
    run_server_until(addr, communicator, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Run the API server until `shutdown` resolves, then stop the communicator
pub async fn run_server_until(
    addr: &str,
    communicator: Arc<Communicator>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let session = Arc::clone(&communicator);
    let router = create_router(communicator);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "communicator API listening");
    println!("📟 Upside Down Communicator API running on {}", addr);
    println!("  GET  /state     - Current snapshot");
    println!("  POST /message   - Set message {{\"text\": ...}}");
    println!("  POST /transmit  - Encode & transmit");
    println!("  POST /stop      - Stop transmission");
    println!("  POST /shake     - Shake to restore");
    println!("  WS   /ws        - Live updates");
    println!("  GET  /health    - Health check");
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await;
    session.shutdown();
    info!("communicator API stopped");
    served?;
    Ok(())
}
