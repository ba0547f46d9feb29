//! Listener configuration loading, mirroring the sender's Raw/validated TOML
//! pattern.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/policy-sync/listener.toml";

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub sender_stream_url: String,
    pub sender_health_url: String,
    pub client_address: String,
    pub dial_retry_interval: Duration,
    pub heartbeat_interval: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    sender: Option<RawSenderConfig>,
    client_address: Option<String>,
    dial_retry_interval_ms: Option<u64>,
    heartbeat_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawSenderConfig {
    stream_url: Option<String>,
    health_url: Option<String>,
}

pub fn load_config() -> Result<ListenerConfig, ConfigError> {
    let path = std::env::var("LISTENER_CONFIG_PATH")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    load_config_from(Path::new(&path))
}

pub fn load_config_from(path: &Path) -> Result<ListenerConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&text, path)
}

fn parse_config(text: &str, path: &Path) -> Result<ListenerConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    let sender = raw.sender.unwrap_or_default();

    Ok(ListenerConfig {
        sender_stream_url: sender
            .stream_url
            .ok_or(ConfigError::MissingField("sender.stream_url"))?,
        sender_health_url: sender
            .health_url
            .ok_or(ConfigError::MissingField("sender.health_url"))?,
        client_address: raw
            .client_address
            .ok_or(ConfigError::MissingField("client_address"))?,
        dial_retry_interval: Duration::from_millis(raw.dial_retry_interval_ms.unwrap_or(2_000)),
        heartbeat_interval: Duration::from_millis(raw.heartbeat_interval_ms.unwrap_or(10_000)),
    })
}
