//! The `/stream` WebSocket endpoint: the `ValidatingPoliciesStream` RPC.
//!
//! Each inbound message is treated as a (re)registration: the first one
//! after connecting, or a later one on the same socket, which supersedes
//! whatever delivery was previously running for that address. Updates after
//! registration arrive out-of-band, pushed onto the same sink by
//! [`crate::state::AppStateInner::send_policy`]; this handler's read loop
//! exists to notice further registrations and disconnection.

use crate::delivery::deliver_with_backoff;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use policy_protocol::{ValidatingPolicyStreamRequest, ValidatingPolicyStreamResponse};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, mut stream) = socket.split();
    let sink = Arc::new(Mutex::new(sink));
    let mut registration: Option<(String, CancellationToken)> = None;

    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let addr = match serde_json::from_str::<ValidatingPolicyStreamRequest>(&text) {
                    Ok(req) if !req.client_address.is_empty() => req.client_address,
                    Ok(_) => {
                        tracing::warn!("rejecting stream registration with empty client address");
                        break;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "malformed stream registration");
                        break;
                    }
                };

                tracing::info!(client_address = %addr, "listener registered");
                let cancel = state.registry.register(addr.clone(), sink.clone()).await;
                registration = Some((addr, cancel.clone()));

                let snapshot = state.store.snapshot().await;
                let response = ValidatingPolicyStreamResponse {
                    current_version: snapshot.version,
                    policies: snapshot.policies,
                };
                let delivery_sink = sink.clone();
                let initial = state.initial_send_policy_wait;
                let max = state.max_send_policy_interval;
                tokio::spawn(async move {
                    deliver_with_backoff(delivery_sink, response, initial, max, &cancel).await;
                });
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "stream receive error, ending session");
                break;
            }
        }
    }

    if let Some((addr, cancel)) = registration {
        state.registry.deregister(&addr, &cancel).await;
        tracing::info!(client_address = %addr, "listener disconnected");
    }
}
