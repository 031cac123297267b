//! Monitoring server process lifecycle.
//!
//! Startup ordering, configuration reload, and graceful shutdown of a
//! monitoring server and its collaborators.

// Process surface
pub mod app;
pub mod cli;
pub mod error;

// Core subsystems
pub mod config;
pub mod lifecycle;
pub mod reload;
pub mod storage;

// Collaborators
pub mod admin;
pub mod http;
pub mod services;

// Cross-cutting concerns
pub mod observability;

pub use config::schema::MonitorConfig;
pub use error::StartupError;
pub use lifecycle::{Server, TerminationEvent};
