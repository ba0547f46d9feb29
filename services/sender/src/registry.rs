//! Tracks connected listeners: their delivery sink, their cancellation
//! handle, and the last time each was heard from.
//!
//! Both the client table and the heartbeat table live behind one mutex so
//! that registering a replacement connection and recording a heartbeat can
//! never interleave -- a reaper scan and a `HealthCheck` update always see a
//! consistent pairing of "is this client still registered" and "when did we
//! last hear from it".

use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use futures_util::stream::SplitSink;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub type ClientSink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

pub struct ClientRegistration {
    pub sink: ClientSink,
    pub cancel: CancellationToken,
}

struct Inner {
    clients: HashMap<String, ClientRegistration>,
    heartbeats: HashMap<String, DateTime<Utc>>,
}

pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                clients: HashMap::new(),
                heartbeats: HashMap::new(),
            }),
        }
    }

    /// Register a client's delivery sink, cancelling and replacing any prior
    /// registration under the same address atomically. Returns the new
    /// cancellation token, which the caller's delivery loop selects on.
    pub async fn register(&self, client_address: String, sink: ClientSink) -> CancellationToken {
        let cancel = CancellationToken::new();
        let mut guard = self.inner.lock().await;
        if let Some(old) = guard.clients.remove(&client_address) {
            old.cancel.cancel();
        }
        guard.clients.insert(
            client_address.clone(),
            ClientRegistration {
                sink,
                cancel: cancel.clone(),
            },
        );
        guard.heartbeats.insert(client_address, Utc::now());
        cancel
    }

    /// Drop a client's registration, e.g. when its connection task exits.
    /// `cancel` is the token this connection was handed at registration time.
    /// If a later connection superseded us, `register` already cancelled our
    /// token, so a cancelled `cancel` here means "don't touch the registry
    /// entry, it belongs to the newer connection now".
    pub async fn deregister(&self, client_address: &str, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            return;
        }
        let mut guard = self.inner.lock().await;
        guard.clients.remove(client_address);
        guard.heartbeats.remove(client_address);
    }

    /// Update the heartbeat table with monotonic-max semantics: a timestamp
    /// older than (or equal to) the one already stored is dropped, guarding
    /// against clock jitter or out-of-order delivery.
    pub async fn record_heartbeat(&self, client_address: &str, time: DateTime<Utc>) {
        let mut guard = self.inner.lock().await;
        let newer = guard
            .heartbeats
            .get(client_address)
            .map(|stored| time > *stored)
            .unwrap_or(true);
        if newer {
            guard.heartbeats.insert(client_address.to_owned(), time);
        }
    }

    /// Cancel every client's outstanding delivery, install a fresh
    /// cancellation handle per client, and return the targets a caller
    /// should dispatch a delivery task to -- all under one lock acquisition,
    /// so a concurrently arriving registration is never skipped by this
    /// fan-out (it either lands before this call, and is included, or after,
    /// and gets the next one).
    pub async fn cancel_all_and_relaunch(&self) -> Vec<(String, ClientSink, CancellationToken)> {
        let mut guard = self.inner.lock().await;
        let mut targets = Vec::with_capacity(guard.clients.len());
        for (addr, reg) in guard.clients.iter_mut() {
            reg.cancel.cancel();
            let fresh = CancellationToken::new();
            reg.cancel = fresh.clone();
            targets.push((addr.clone(), reg.sink.clone(), fresh));
        }
        targets
    }

    /// Take the lock, compute the stale set, and remove it in the same
    /// critical section -- no client can record a heartbeat between the scan
    /// and the eviction.
    pub async fn reap_inactive(&self, max_inactive: chrono::Duration, now: DateTime<Utc>) -> Vec<String> {
        let mut guard = self.inner.lock().await;
        let stale: Vec<String> = guard
            .heartbeats
            .iter()
            .filter(|(_, last_seen)| now.signed_duration_since(**last_seen) > max_inactive)
            .map(|(addr, _)| addr.clone())
            .collect();
        for addr in &stale {
            if let Some(reg) = guard.clients.remove(addr) {
                reg.cancel.cancel();
            }
            guard.heartbeats.remove(addr);
        }
        stale
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.clients.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
