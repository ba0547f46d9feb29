//! The unary `/healthz` endpoint: a listener's periodic liveness pulse.
//!
//! An empty client address or a zero timestamp is silently ignored -- the
//! reply is always an empty success, matching the bidirectional stream's
//! tolerance of malformed input from a single client not affecting anyone
//! else.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use policy_protocol::{HealthCheckRequest, HealthCheckResponse};

pub async fn health_check_handler(
    State(state): State<AppState>,
    Json(req): Json<HealthCheckRequest>,
) -> Json<HealthCheckResponse> {
    let empty_time = req.time.timestamp() == 0 && req.time.timestamp_subsec_nanos() == 0;
    if req.client_address.is_empty() || empty_time {
        tracing::debug!("ignoring health check with empty field");
        return Json(HealthCheckResponse::default());
    }

    state
        .registry
        .record_heartbeat(&req.client_address, req.time)
        .await;
    tracing::debug!(client_address = %req.client_address, "heartbeat recorded");

    Json(HealthCheckResponse::default())
}
