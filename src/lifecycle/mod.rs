//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Open storage → Register metrics → Spawn services
//!     → Open reload gate → Wait for termination
//!
//! Shutdown (shutdown.rs):
//!     SIGINT/SIGTERM | quit request | listen error
//!     → first one wins → cancel queries → stop in reverse order → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Termination event
//!     SIGHUP → Reload trigger
//! ```
//!
//! # Design Decisions
//! - Ordered startup: storage first, API last
//! - Ordered shutdown: exact mirror of startup (sequencer.rs)
//! - Stop errors are logged, never abort the teardown

pub mod sequencer;
pub mod service;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use sequencer::{LifecycleSequencer, Subsystems};
pub use service::Service;
pub use shutdown::{
    termination_channel, ShutdownArbiter, TerminationEvent, TerminationSenders,
    TerminationSources,
};
pub use startup::{Server, DEFAULT_SHUTDOWN_GRACE};
