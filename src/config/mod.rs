//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize, append CLI alertmanagers)
//!     → MonitorConfig (immutable snapshot)
//!     → shared via Arc to every Reloadable
//!
//! On reload trigger:
//!     reload coordinator calls ConfigSource::load again
//!     → new Arc<MonitorConfig> supersedes the old one wholesale
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Sources never cache, so external edits are always picked up in full

pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigSource, FileSource};
pub use schema::{
    AlertingConfig, AlertmanagerConfig, GlobalConfig, MonitorConfig, RemoteEndpointConfig,
    ScrapeConfig,
};
