use crate::config::SenderConfig;
use crate::delivery::deliver_with_backoff;
use crate::registry::Registry;
use crate::store::{PolicyRecord, PolicyStore};
use axum::routing::{get, post};
use axum::Router;
use policy_protocol::ValidatingPolicyStreamResponse;
use std::sync::Arc;
use std::time::Duration;

pub struct AppStateInner {
    pub store: PolicyStore,
    pub registry: Registry,
    pub initial_send_policy_wait: Duration,
    pub max_send_policy_interval: Duration,
    pub client_flush_interval: Duration,
    pub max_client_inactive_duration: chrono::Duration,
}

pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    /// `StorePolicy`: insert/overwrite under the store lock. Does not bump
    /// the version or fan out; pair with a later [`Self::send_policy`].
    pub async fn store_policy(&self, name: String, record: PolicyRecord) {
        self.store.store_policy(name, record).await;
    }

    /// `DeletePolicy`: remove under the store lock. Same pairing discipline
    /// as `store_policy`.
    pub async fn delete_policy(&self, name: &str) {
        self.store.delete_policy(name).await;
    }

    /// `SendPolicy`: bump the version and snapshot the store, then cancel
    /// every client's outstanding delivery and launch a fresh one per client
    /// against the new snapshot. Returns once every delivery task has been
    /// launched, not once they've completed; failures are logged inside each
    /// task and never surface here.
    pub async fn send_policy(self: &Arc<Self>) {
        let snapshot = self.store.bump_and_snapshot().await;
        let response = ValidatingPolicyStreamResponse {
            current_version: snapshot.version,
            policies: snapshot.policies,
        };
        let targets = self.registry.cancel_all_and_relaunch().await;
        tracing::info!(version = response.current_version, clients = targets.len(), "fanning out policy snapshot");
        for (_client_address, sink, cancel) in targets {
            let response = response.clone();
            let initial = self.initial_send_policy_wait;
            let max = self.max_send_policy_interval;
            tokio::spawn(async move {
                deliver_with_backoff(sink, response, initial, max, &cancel).await;
            });
        }
    }
}

pub fn build_state(config: &SenderConfig) -> AppState {
    Arc::new(AppStateInner {
        store: PolicyStore::new(),
        registry: Registry::new(),
        initial_send_policy_wait: config.initial_send_policy_wait,
        max_send_policy_interval: config.max_send_policy_interval,
        client_flush_interval: config.client_flush_interval,
        max_client_inactive_duration: chrono::Duration::from_std(
            config.max_client_inactive_duration,
        )
        .unwrap_or(chrono::Duration::zero()),
    })
}

pub fn build_stream_router(state: AppState) -> Router {
    Router::new()
        .route("/stream", get(crate::stream::stream_handler))
        .with_state(state)
}

pub fn build_health_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", post(crate::health::health_check_handler))
        .with_state(state)
}
