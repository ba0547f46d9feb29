#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to connect to sender: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sender closed the stream")]
    StreamClosed,

    #[error("heartbeat request failed: {0}")]
    Heartbeat(#[from] reqwest::Error),

    #[error("policy processor rejected an update: {0}")]
    Processor(String),
}
