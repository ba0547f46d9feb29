pub mod config;
pub mod delivery;
pub mod health;
pub mod reaper;
pub mod registry;
pub mod state;
pub mod store;
pub mod stream;

pub use config::{ConfigError, SenderConfig};
pub use state::{build_health_router, build_state, build_stream_router, AppState, AppStateInner};
pub use store::{PolicyRecord, Snapshot};
