//! Monitoring server.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!   SIGHUP ──────▶│  reload trigger queue ──▶ reload coordinator         │
//!   POST /-/reload│        (gated until startup)    │                    │
//!                 │                                 ▼                    │
//!                 │   remote write, remote read, target manager,         │
//!                 │   rule evaluator, web, notifier  (apply_config)      │
//!                 │                                                      │
//!   SIGINT/TERM ─▶│  shutdown arbiter ──▶ lifecycle sequencer            │
//!   POST /-/quit ─▶│   (first event wins)   start: storage → ... → web    │
//!   listen error ─▶│                        stop: reverse, queries first  │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;

use monitord::app::assemble;
use monitord::cli::Cli;
use monitord::observability::logging::init_logging;
use monitord::observability::metrics::init_metrics;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 2 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(&cli.log_level, cli.log_format);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting monitord");

    let metrics = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install metrics recorder");
            None
        }
    };

    let server = match assemble(&cli, metrics) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::from(e.exit_code());
        }
    };

    match server.run().await {
        Ok(event) => {
            tracing::info!(reason = event.reason(), "Exiting");
            ExitCode::from(event.exit_code())
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::from(e.exit_code())
        }
    }
}
