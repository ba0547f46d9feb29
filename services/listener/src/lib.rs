pub mod client;
pub mod config;
pub mod error;
pub mod processor;

pub use client::Listener;
pub use config::{ConfigError, ListenerConfig};
pub use error::ListenerError;
pub use processor::{NoopProcessor, PolicyProcessor};
