//! # WebSocket gateway.
//!
//! Accepts connections on `/`, performs admission, and bridges each admitted
//! socket to the supervisor:
//!
//! ```text
//! client ──ws──► ws_handler ──admission──┬─ Err ─► ERROR Unauthorized ─► close
//!                                        └─ Ok ──► supervisor.connect() (seeded STATUS)
//!                                                     │
//!                    inbound text "start"/"stop"/...  ├──► supervisor.dispatch(Command)
//!                    outbound Event JSON  ◄───────────┘◄── Subscription::recv()
//! ```
//!
//! ## Rules
//! - The secret is read from the `x-secret` header, or the `secret` query parameter.
//! - Unknown inbound messages are ignored.
//! - A connection leaves the connection set when its socket closes or a write fails.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        ConnectInfo, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::HeaderMap,
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::core::SupervisorHandle;
use crate::error::AdmissionError;
use crate::events::{Command, Event};
use crate::gateway::Admission;

/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "x-secret";

#[derive(Clone)]
struct GatewayState {
    supervisor: SupervisorHandle,
    admission: Arc<Admission>,
}

#[derive(Debug, Default, Deserialize)]
struct ConnectParams {
    secret: Option<String>,
}

/// WebSocket front end of the supervisor.
pub struct Gateway {
    state: GatewayState,
}

impl Gateway {
    /// Creates a gateway for `supervisor` guarded by `admission`.
    pub fn new(supervisor: SupervisorHandle, admission: Admission) -> Self {
        Self {
            state: GatewayState {
                supervisor,
                admission: Arc::new(admission),
            },
        }
    }

    /// Builds the axum router.
    ///
    /// Must be served with `into_make_service_with_connect_info::<SocketAddr>()`.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(ws_handler))
            .with_state(self.state.clone())
    }

    /// Serves connections from `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<ConnectParams>,
) -> Response {
    let presented = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or(params.secret);
    let admitted = state.admission.check(presented.as_deref());

    ws.on_upgrade(move |socket| async move {
        match admitted {
            Ok(()) => serve_connection(socket, state.supervisor, peer).await,
            Err(err) => reject(socket, peer, err).await,
        }
    })
}

async fn reject(mut socket: WebSocket, peer: SocketAddr, err: AdmissionError) {
    tracing::warn!(%peer, label = err.as_label(), "rejected connection: {}", err.as_message());

    if let Ok(json) = Event::unauthorized().to_json() {
        let _ = socket.send(Message::Text(json.into())).await;
    }
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: "Unauthorized".into(),
        })))
        .await;
}

async fn serve_connection(socket: WebSocket, supervisor: SupervisorHandle, peer: SocketAddr) {
    let mut events = match supervisor.connect(peer.to_string()).await {
        Ok(events) => events,
        Err(err) => {
            tracing::warn!(
                %peer,
                label = err.as_label(),
                "cannot register connection: {}",
                err.as_message()
            );
            return;
        }
    };
    let connection = events.id();
    tracing::info!(%peer, %connection, "client connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            ev = events.recv() => {
                let Some(ev) = ev else {
                    tracing::debug!(%peer, %connection, "removed from connection set");
                    break;
                };
                let json = match ev.to_json() {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::warn!(%connection, error = %err, "cannot encode event");
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if !forward(&supervisor, text.as_str()).await {
                        break;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    if let Ok(text) = std::str::from_utf8(&bytes) {
                        if !forward(&supervisor, text).await {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!(%peer, error = %err, "websocket read failed");
                    break;
                }
            }
        }
    }

    drop(events);
    tracing::info!(%peer, %connection, "client disconnected");
}

/// Forwards one inbound message. Returns `false` once the supervisor is gone.
async fn forward(supervisor: &SupervisorHandle, text: &str) -> bool {
    match text.parse::<Command>() {
        Ok(command) => supervisor.dispatch(command).await.is_ok(),
        Err(err) => {
            tracing::debug!(error = %err, "ignoring inbound message");
            true
        }
    }
}
