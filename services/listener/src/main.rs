use listener::{Listener, NoopProcessor};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    let config = listener::config::load_config().expect("failed to load listener config");
    info!(client_address = %config.client_address, "starting listener");

    let listener = Listener::new(config, NoopProcessor);
    listener.run().await;
}
