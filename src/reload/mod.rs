//! Configuration reload subsystem.
//!
//! # Data Flow
//! ```text
//! SIGHUP ──────────────┐
//!                      ├─→ trigger.rs (one merged queue)
//! POST /-/reload ──────┘        │
//!                               ▼
//!            gate.rs (held closed until startup completes)
//!                               │
//!                               ▼
//!            coordinator.rs (single loop, one trigger at a time)
//!                → ConfigSource::load
//!                → Reloadable::apply_config for every registered subsystem
//!                → status.rs (last-reload gauges)
//! ```
//!
//! # Design Decisions
//! - One consumer task; a reload never overlaps another
//! - A failing reloadable never stops the others from seeing the config
//! - No rollback and no retry; the operator fixes the file and re-triggers

pub mod coordinator;
pub mod gate;
pub mod reloadable;
pub mod status;
pub mod trigger;

use thiserror::Error;

use crate::config::ConfigError;

pub use coordinator::ReloadCoordinator;
pub use gate::{gate, GateWaiter, StartupGate};
pub use reloadable::{ApplyError, Reloadable, Reloadables};
pub use status::{ReloadStatus, ReloadStatusSink, ReloadStatusSnapshot};
pub use trigger::{ReloadRequester, ReloadTrigger};

/// Outcome of a failed reload.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// The configuration could not be loaded; nothing was applied.
    #[error("couldn't load configuration ({location}): {error}")]
    Load {
        location: String,
        #[source]
        error: ConfigError,
    },

    /// At least one reloadable rejected the configuration.
    #[error("one or more errors occurred while applying the new configuration ({location}); failed: {}", .failed.join(", "))]
    Apply {
        location: String,
        failed: Vec<String>,
    },

    /// The reload loop is no longer running.
    #[error("reload coordinator is not running")]
    CoordinatorClosed,

    /// A reloadable panicked while applying the configuration.
    #[error("reload task panicked: {0}")]
    Panicked(String),
}
