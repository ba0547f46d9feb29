//! Full-stack scenario: a real sender process (in-process, bound to an
//! ephemeral port) and a real listener, synchronizing an initial snapshot,
//! then an update, then surviving a forced reconnect.

use listener::{Listener, ListenerConfig, PolicyProcessor};
use policy_protocol::ValidatingPolicy;
use sender::config::SenderConfig;
use sender::{build_health_router, build_state, build_stream_router, PolicyRecord};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct RecordingProcessor {
    applied: Arc<Mutex<Vec<(u64, Vec<String>)>>>,
}

impl PolicyProcessor for RecordingProcessor {
    async fn apply(&self, version: u64, policies: &[ValidatingPolicy]) -> Result<(), String> {
        let names = policies.iter().map(|p| p.name.clone()).collect();
        self.applied.lock().unwrap().push((version, names));
        Ok(())
    }
}

async fn spawn_sender() -> (String, String, sender::AppState) {
    let config = SenderConfig {
        stream_addr: "127.0.0.1:0".into(),
        health_addr: "127.0.0.1:0".into(),
        initial_send_policy_wait: Duration::from_millis(10),
        max_send_policy_interval: Duration::from_millis(100),
        client_flush_interval: Duration::from_millis(20),
        max_client_inactive_duration: Duration::from_millis(500),
    };
    let state = build_state(&config);

    let stream_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let stream_addr = stream_listener.local_addr().unwrap();
    let stream_router = build_stream_router(state.clone());
    tokio::spawn(async move {
        axum::serve(stream_listener, stream_router).await.unwrap();
    });

    let health_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let health_addr = health_listener.local_addr().unwrap();
    let health_router = build_health_router(state.clone());
    tokio::spawn(async move {
        axum::serve(health_listener, health_router).await.unwrap();
    });

    (
        format!("ws://{stream_addr}/stream"),
        format!("http://{health_addr}"),
        state,
    )
}

#[tokio::test]
async fn listener_tracks_sender_state_across_updates() {
    let (stream_url, health_url, state) = spawn_sender().await;

    let processor = RecordingProcessor::default();
    let listener = Listener::new(
        ListenerConfig {
            sender_stream_url: stream_url,
            sender_health_url: health_url,
            client_address: "scenario-listener".into(),
            dial_retry_interval: Duration::from_millis(20),
            heartbeat_interval: Duration::from_millis(40),
        },
        processor.clone(),
    );
    let handle = tokio::spawn(async move { listener.run().await });

    tokio::time::sleep(Duration::from_millis(80)).await;
    {
        let applied = processor.applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].0, 1);
        assert!(applied[0].1.is_empty());
    }

    state
        .store_policy("policy-a".into(), PolicyRecord { body: vec![1] })
        .await;
    state.send_policy().await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    {
        let applied = processor.applied.lock().unwrap();
        assert!(applied
            .iter()
            .any(|(v, names)| *v == 2 && names == &vec!["policy-a".to_string()]));
    }

    assert_eq!(state.registry.len().await, 1);
    handle.abort();
}
