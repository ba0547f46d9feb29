//! Delivery of policy snapshots to a single client, with cancellable
//! exponential backoff on send failure.
//!
//! A delivery task never holds the registry lock or the store lock while
//! writing to the socket: it is handed a clone of the client's sink and the
//! snapshot bytes up front, and only locks the per-client sink mutex for the
//! duration of one write.

use crate::registry::ClientSink;
use axum::extract::ws::Message;
use futures_util::SinkExt;
use policy_protocol::ValidatingPolicyStreamResponse;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Attempt delivery, retrying with exponential backoff (doubling, capped at
/// `max_interval`) until it succeeds or `cancel` fires. A cancellation mid
/// backoff-sleep aborts immediately without a further send attempt.
pub async fn deliver_with_backoff(
    sink: ClientSink,
    response: ValidatingPolicyStreamResponse,
    initial_interval: Duration,
    max_interval: Duration,
    cancel: &CancellationToken,
) {
    let payload = match serde_json::to_string(&response) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode policy snapshot");
            return;
        }
    };

    let mut wait = initial_interval;
    loop {
        let send_result = {
            let mut guard = sink.lock().await;
            guard.send(Message::Text(payload.clone().into())).await
        };

        match send_result {
            Ok(()) => return,
            Err(err) => {
                tracing::warn!(error = %err, version = response.current_version, "policy delivery failed, backing off");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(wait) => {}
        }
        wait = std::cmp::min(wait * 2, max_interval);
    }
}
