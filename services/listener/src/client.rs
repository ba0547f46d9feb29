//! The listener's stream session: connect, register, apply the initial
//! snapshot, then keep applying snapshots as they arrive. Any stream error
//! -- not just a failed initial dial -- triggers a fresh reconnect attempt.

use crate::config::ListenerConfig;
use crate::error::ListenerError;
use crate::processor::PolicyProcessor;
use futures_util::{SinkExt, StreamExt};
use policy_protocol::{ValidatingPolicy, ValidatingPolicyStreamRequest, ValidatingPolicyStreamResponse};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::Message;

pub struct Listener<P: PolicyProcessor> {
    config: ListenerConfig,
    processor: Arc<P>,
    last_applied_version: Arc<Mutex<Option<u64>>>,
}

impl<P: PolicyProcessor + 'static> Listener<P> {
    pub fn new(config: ListenerConfig, processor: P) -> Self {
        Self {
            config,
            processor: Arc::new(processor),
            last_applied_version: Arc::new(Mutex::new(None)),
        }
    }

    /// Run the stream session and the heartbeat pulse concurrently, forever.
    /// Returns only if the process is being torn down around it; stream
    /// errors are logged and retried rather than propagated.
    pub async fn run(&self) {
        tokio::join!(self.run_stream_with_retry(), self.run_heartbeat());
    }

    async fn run_stream_with_retry(&self) {
        loop {
            if let Err(err) = self.run_stream_session().await {
                tracing::warn!(error = %err, "listener stream session ended, reconnecting");
            }
            tokio::time::sleep(self.config.dial_retry_interval).await;
        }
    }

    async fn run_stream_session(&self) -> Result<(), ListenerError> {
        tracing::info!(url = %self.config.sender_stream_url, "connecting to sender");
        let (ws_stream, _) = tokio_tungstenite::connect_async(&self.config.sender_stream_url).await?;
        let (mut write, mut read) = ws_stream.split();

        let req = ValidatingPolicyStreamRequest {
            client_address: self.config.client_address.clone(),
        };
        write
            .send(Message::Text(serde_json::to_string(&req)?.into()))
            .await?;

        // The first snapshot on a freshly (re)established connection is
        // applied synchronously, mirroring the one-shot bootstrap sync a
        // caller performs before treating the listener as ready. Every
        // later snapshot on the same connection is steady-state traffic:
        // it is applied in the background so a slow processor never stalls
        // the read loop that must keep noticing supersessions and errors.
        let mut first_snapshot = true;

        loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => {
                    let response: ValidatingPolicyStreamResponse = serde_json::from_str(&text)?;
                    if first_snapshot {
                        first_snapshot = false;
                        Self::apply_if_new(
                            &self.processor,
                            &self.last_applied_version,
                            response.current_version,
                            &response.policies,
                        )
                        .await;
                    } else {
                        self.dispatch_apply(response.current_version, response.policies);
                    }
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Err(ListenerError::StreamClosed),
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(err.into()),
            }
        }
    }

    /// Spawn the processor application so the caller doesn't wait on it.
    /// `apply_if_new`'s own version check still runs inside the task, so a
    /// burst of snapshots that arrive before any of them finish applying
    /// will still only apply each distinct version once.
    fn dispatch_apply(&self, version: u64, policies: Vec<ValidatingPolicy>) {
        let processor = self.processor.clone();
        let last_applied = self.last_applied_version.clone();
        tokio::spawn(async move {
            Self::apply_if_new(&processor, &last_applied, version, &policies).await;
        });
    }

    /// Re-apply whenever the incoming version differs from the last one
    /// applied, in either direction -- a rollback to an earlier version is
    /// still a change the processor must see, not something to suppress.
    async fn apply_if_new(
        processor: &P,
        last_applied_version: &Mutex<Option<u64>>,
        version: u64,
        policies: &[ValidatingPolicy],
    ) {
        let mut last = last_applied_version.lock().await;
        if *last == Some(version) {
            return;
        }
        match processor.apply(version, policies).await {
            Ok(()) => {
                tracing::info!(version, policy_count = policies.len(), "applied policy snapshot");
                *last = Some(version);
            }
            Err(err) => {
                tracing::error!(version, error = %err, "processor rejected policy snapshot");
            }
        }
    }

    async fn run_heartbeat(&self) {
        let http = reqwest::Client::new();
        let mut interval = tokio::time::interval(self.config.heartbeat_interval);
        loop {
            interval.tick().await;
            if let Err(err) = self.send_heartbeat(&http).await {
                tracing::warn!(error = %err, "heartbeat failed");
            }
        }
    }

    async fn send_heartbeat(&self, http: &reqwest::Client) -> Result<(), ListenerError> {
        let req = policy_protocol::HealthCheckRequest {
            client_address: self.config.client_address.clone(),
            time: chrono::Utc::now(),
        };
        http.post(format!("{}/healthz", self.config.sender_health_url))
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
