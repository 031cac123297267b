//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → status handlers (health, readiness, config, reload status, metrics)
//!     → admin/ (reload and quit, optionally behind a bearer token)
//!         → reload coordinator / shutdown arbiter
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, ApiServer, AppState};
