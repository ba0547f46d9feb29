//! Full-stack scenario: one sender, three concurrent listeners. A single
//! policy update must fan out to all of them independently, and a late
//! joiner must receive full current state rather than a partial history.

use policy_test_utils::MockListenerClient;
use sender::config::SenderConfig;
use sender::{build_health_router, build_state, build_stream_router, PolicyRecord};
use std::time::Duration;

async fn spawn_sender() -> (String, sender::AppState) {
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
    let health_router = build_health_router(state.clone());
    tokio::spawn(async move {
        axum::serve(health_listener, health_router).await.unwrap();
    });

    (format!("ws://{stream_addr}/stream"), state)
}

#[tokio::test]
async fn single_update_reaches_every_connected_listener() {
    let (stream_url, state) = spawn_sender().await;

    let mut clients = Vec::new();
    for i in 0..3 {
        let mut client = MockListenerClient::connect(&stream_url).await.unwrap();
        client.register(&format!("fan-out-{i}")).await.unwrap();
        let initial = client.recv_snapshot().await.unwrap();
        assert_eq!(initial.current_version, 1);
        clients.push(client);
    }
    assert_eq!(state.registry.len().await, 3);

    state
        .store_policy("shared".into(), PolicyRecord { body: vec![7] })
        .await;
    state.send_policy().await;

    for client in &mut clients {
        let snapshot = client.recv_snapshot().await.unwrap();
        assert_eq!(snapshot.current_version, 2);
        assert_eq!(snapshot.policies.len(), 1);
        assert_eq!(snapshot.policies[0].name, "shared");
    }
}

#[tokio::test]
async fn late_joiner_gets_full_state_not_incremental_history() {
    let (stream_url, state) = spawn_sender().await;

    let mut early = MockListenerClient::connect(&stream_url).await.unwrap();
    early.register("early-joiner").await.unwrap();
    let _ = early.recv_snapshot().await.unwrap();

    for i in 0..5 {
        state
            .store_policy(format!("policy-{i}"), PolicyRecord { body: vec![i as u8] })
            .await;
    }
    state.send_policy().await;

    let mut late = MockListenerClient::connect(&stream_url).await.unwrap();
    late.register("late-joiner").await.unwrap();
    let snapshot = late.recv_snapshot().await.unwrap();

    assert_eq!(snapshot.current_version, 2);
    assert_eq!(snapshot.policies.len(), 5);
}
