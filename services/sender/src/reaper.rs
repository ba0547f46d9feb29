//! Background loop that evicts clients which have gone quiet for longer
//! than `max_client_inactive_duration`, cancelling their delivery tasks so
//! connection handlers unwind promptly instead of lingering on a dead peer.

use crate::state::AppState;

pub async fn run(state: AppState, tick: std::time::Duration) {
    let mut interval = tokio::time::interval(tick);
    loop {
        interval.tick().await;
        let now = chrono::Utc::now();
        let reaped = state
            .registry
            .reap_inactive(state.max_client_inactive_duration, now)
            .await;
        for addr in &reaped {
            tracing::info!(client_address = %addr, "reaped inactive listener");
        }
    }
}
