//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → GET /metrics (Prometheus scrape of our own state)
//! ```
//!
//! # Design Decisions
//! - Reload status gauges are only described after storage is open
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
