use sender::{build_health_router, build_state, build_stream_router};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    let config = sender::config::load_config().expect("failed to load sender config");
    let state = build_state(&config);

    let reaper_state = state.clone();
    tokio::spawn(sender::reaper::run(reaper_state, config.client_flush_interval));

    let stream_router = build_stream_router(state.clone());
    let stream_listener = tokio::net::TcpListener::bind(&config.stream_addr)
        .await
        .expect("failed to bind stream address");
    info!(addr = %config.stream_addr, "accepting listener streams");

    let health_router = build_health_router(state);
    let health_listener = tokio::net::TcpListener::bind(&config.health_addr)
        .await
        .expect("failed to bind health address");
    info!(addr = %config.health_addr, "accepting health checks");

    tokio::select! {
        result = axum::serve(stream_listener, stream_router).with_graceful_shutdown(shutdown_signal()) => {
            result.expect("stream server error");
        }
        result = axum::serve(health_listener, health_router).with_graceful_shutdown(shutdown_signal()) => {
            result.expect("health server error");
        }
    }
    info!("sender shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful shutdown.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}
