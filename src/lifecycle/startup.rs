//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the initial configuration before anything is started
//! - Start all subsystems in dependency order
//! - Open the reload gate once everything is running
//! - Wait for a termination event and run the single teardown
//!
//! # Design Decisions
//! - Fail fast: initial config and storage errors are fatal
//! - Listeners start last (traffic only when ready)

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::StartupError;
use crate::lifecycle::sequencer::{LifecycleSequencer, Subsystems};
use crate::lifecycle::shutdown::{ShutdownArbiter, TerminationEvent};
use crate::reload::{gate, ReloadCoordinator, ReloadTrigger};

/// How long run loops get to return after their stop call.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// A fully assembled server, ready to run.
pub struct Server<S> {
    pub subsystems: Subsystems,
    pub coordinator: ReloadCoordinator,
    pub triggers: mpsc::UnboundedReceiver<ReloadTrigger>,
    pub arbiter: ShutdownArbiter<S>,
    /// Shared by the rule evaluator and the query path.
    pub query_token: CancellationToken,
    pub shutdown_grace: Duration,
}

impl<S> Server<S>
where
    S: Future<Output = &'static str> + Send,
{
    /// Run until a termination event, then tear down.
    ///
    /// Returns the event that ended the process, or the fatal error that
    /// prevented it from serving.
    pub async fn run(self) -> Result<TerminationEvent, StartupError> {
        let Server {
            subsystems,
            coordinator,
            triggers,
            arbiter,
            query_token,
            shutdown_grace,
        } = self;

        if let Err(e) = coordinator.reload_blocking().await {
            tracing::error!(error = %e, "Error loading config");
            return Err(StartupError::InitialConfig(e));
        }

        let (startup_gate, waiter) = gate();
        tokio::spawn(coordinator.run(waiter, triggers));

        let mut sequencer = LifecycleSequencer::new(query_token);
        if let Err(e) = sequencer.start(subsystems) {
            tracing::error!(error = %e, "Error opening storage");
            return Err(e.into());
        }

        startup_gate.open();
        tracing::info!("Server is ready to receive requests");

        // Signal handlers were installed during assembly; one delivered while
        // starting is held until here and acts immediately.
        let event = arbiter.wait().await;
        sequencer.shutdown(shutdown_grace).await;

        tracing::info!("See you next time!");
        Ok(event)
    }
}
