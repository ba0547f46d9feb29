// policy-test-utils: Shared test harness for exercising a real sender from
// outside, without pulling in the listener crate.
//
// `MockListenerClient` speaks the raw wire protocol directly so sender-side
// tests can assert on exact frames without depending on listener internals.

pub mod mock_listener_client;

pub use mock_listener_client::MockListenerClient;

/// Post a `HealthCheck` unary call against a running sender.
pub async fn send_health_check(
    base_url: &str,
    client_address: &str,
    time: chrono::DateTime<chrono::Utc>,
) -> Result<(), reqwest::Error> {
    let req = policy_protocol::HealthCheckRequest {
        client_address: client_address.to_owned(),
        time,
    };
    reqwest::Client::new()
        .post(format!("{base_url}/healthz"))
        .json(&req)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
