//! Sender configuration loading.
//!
//! TOML is the sole config source; no environment variable overrides except
//! for the config path itself (`SENDER_CONFIG_PATH`).
//!
//! # Required fields
//! - `bind.stream_addr`
//! - `bind.health_addr`
//!
//! Everything else has a default matching the reference design's backoff and
//! liveness bounds.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default path consulted when `SENDER_CONFIG_PATH` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/policy-sync/sender.toml";

#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub stream_addr: String,
    pub health_addr: String,
    pub initial_send_policy_wait: Duration,
    pub max_send_policy_interval: Duration,
    pub client_flush_interval: Duration,
    pub max_client_inactive_duration: Duration,
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
    bind: Option<RawBindConfig>,
    backoff: Option<RawBackoffConfig>,
    liveness: Option<RawLivenessConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct RawBindConfig {
    stream_addr: Option<String>,
    health_addr: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawBackoffConfig {
    initial_send_policy_wait_ms: Option<u64>,
    max_send_policy_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawLivenessConfig {
    client_flush_interval_ms: Option<u64>,
    max_client_inactive_duration_ms: Option<u64>,
}

/// Load config from `SENDER_CONFIG_PATH`, falling back to [`DEFAULT_CONFIG_PATH`].
pub fn load_config() -> Result<SenderConfig, ConfigError> {
    let path =
        std::env::var("SENDER_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    load_config_from(Path::new(&path))
}

pub fn load_config_from(path: &Path) -> Result<SenderConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&text, path)
}

fn parse_config(text: &str, path: &Path) -> Result<SenderConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    let bind = raw.bind.unwrap_or_default();
    let backoff = raw.backoff.unwrap_or_default();
    let liveness = raw.liveness.unwrap_or_default();

    Ok(SenderConfig {
        stream_addr: bind
            .stream_addr
            .ok_or(ConfigError::MissingField("bind.stream_addr"))?,
        health_addr: bind
            .health_addr
            .ok_or(ConfigError::MissingField("bind.health_addr"))?,
        initial_send_policy_wait: Duration::from_millis(
            backoff.initial_send_policy_wait_ms.unwrap_or(250),
        ),
        max_send_policy_interval: Duration::from_millis(
            backoff.max_send_policy_interval_ms.unwrap_or(30_000),
        ),
        client_flush_interval: Duration::from_millis(
            liveness.client_flush_interval_ms.unwrap_or(10_000),
        ),
        max_client_inactive_duration: Duration::from_millis(
            liveness.max_client_inactive_duration_ms.unwrap_or(90_000),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml = r#"
            [bind]
            stream_addr = "0.0.0.0:7443"
            health_addr = "0.0.0.0:7080"

            [backoff]
            initial_send_policy_wait_ms = 500
            max_send_policy_interval_ms = 60000

            [liveness]
            client_flush_interval_ms = 5000
            max_client_inactive_duration_ms = 120000
        "#;
        let cfg = parse_config(toml, Path::new("test.toml")).unwrap();
        assert_eq!(cfg.stream_addr, "0.0.0.0:7443");
        assert_eq!(cfg.health_addr, "0.0.0.0:7080");
        assert_eq!(cfg.initial_send_policy_wait, Duration::from_millis(500));
        assert_eq!(cfg.max_send_policy_interval, Duration::from_millis(60_000));
        assert_eq!(cfg.client_flush_interval, Duration::from_millis(5_000));
        assert_eq!(
            cfg.max_client_inactive_duration,
            Duration::from_millis(120_000)
        );
    }

    #[test]
    fn defaults_backoff_and_liveness_when_omitted() {
        let toml = r#"
            [bind]
            stream_addr = "0.0.0.0:7443"
            health_addr = "0.0.0.0:7080"
        "#;
        let cfg = parse_config(toml, Path::new("test.toml")).unwrap();
        assert_eq!(cfg.initial_send_policy_wait, Duration::from_millis(250));
        assert_eq!(cfg.max_send_policy_interval, Duration::from_millis(30_000));
    }

    #[test]
    fn missing_bind_addr_errors() {
        let toml = r#"
            [bind]
            health_addr = "0.0.0.0:7080"
        "#;
        let err = parse_config(toml, Path::new("test.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("bind.stream_addr")));
    }
}
