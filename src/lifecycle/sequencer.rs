//! Dependency-ordered startup with mirrored teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::service::Service;
use crate::observability::metrics;
use crate::storage::{Storage, StorageError};

/// Every subsystem the sequencer starts, one field per dependency slot.
pub struct Subsystems {
    pub storage: Arc<dyn Storage>,
    /// Sample sink fed by storage; absent when remote write is not wired up.
    pub remote_write: Option<Arc<dyn Service>>,
    pub notifier: Arc<dyn Service>,
    pub rule_evaluator: Arc<dyn Service>,
    pub target_manager: Arc<dyn Service>,
    pub api: Arc<dyn Service>,
}

type StopAction = Box<dyn FnOnce() -> Result<(), String> + Send>;

/// Starts subsystems in dependency order and stops them in exact reverse.
///
/// Every start step registers its stop action before the next step runs, so
/// a failure part-way through, a panic, or a normal shutdown all unwind
/// exactly what was started. Dropping the sequencer unwinds anything left.
pub struct LifecycleSequencer {
    query_token: CancellationToken,
    stops: Vec<(&'static str, StopAction)>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl LifecycleSequencer {
    /// `query_token` is cancelled first thing during teardown.
    pub fn new(query_token: CancellationToken) -> Self {
        Self {
            query_token,
            stops: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Start everything in the fixed order:
    /// storage → instrumentation → remote write → notifier → rule evaluator
    /// → target manager → API.
    ///
    /// Storage failure is returned before anything else is touched.
    pub fn start(&mut self, subsystems: Subsystems) -> Result<(), StorageError> {
        let Subsystems {
            storage,
            remote_write,
            notifier,
            rule_evaluator,
            target_manager,
            api,
        } = subsystems;

        self.start_storage(storage.clone())?;

        // Storage has to be fully initialized before registering its metrics.
        storage.register_metrics();
        metrics::describe_reload_metrics();

        if let Some(remote_write) = remote_write {
            self.spawn(remote_write);
        }
        // The notifier is a dependency of the rule evaluator: started before,
        // torn down after.
        self.spawn(notifier);
        self.spawn(rule_evaluator);
        self.spawn(target_manager);
        self.spawn(api);
        Ok(())
    }

    /// Open storage synchronously and register its close.
    pub fn start_storage(&mut self, storage: Arc<dyn Storage>) -> Result<(), StorageError> {
        storage.start()?;
        let name = storage.name();
        let stop: StopAction = Box::new(move || storage.stop().map_err(|e| e.to_string()));
        self.stops.push((name, stop));
        tracing::debug!(component = name, "Started");
        Ok(())
    }

    /// Launch a service's run loop as its own task and register its stop.
    pub fn spawn(&mut self, service: Arc<dyn Service>) {
        let name = service.name();
        let runner = service.clone();
        let handle = tokio::spawn(async move {
            runner.run().await;
            tracing::debug!(component = name, "Run loop exited");
        });
        self.tasks.push((name, handle));
        let stop: StopAction = Box::new(move || {
            service.stop();
            Ok(())
        });
        self.stops.push((name, stop));
        tracing::debug!(component = name, "Started");
    }

    /// Names of started components, in start order.
    pub fn started(&self) -> Vec<&'static str> {
        self.stops.iter().map(|(name, _)| *name).collect()
    }

    /// Cancel in-flight queries, stop everything in reverse order, then give
    /// run loops up to `grace` to return.
    pub async fn shutdown(mut self, grace: Duration) {
        self.unwind();

        let tasks = std::mem::take(&mut self.tasks);
        let joined = async {
            for (name, handle) in tasks {
                if let Err(e) = handle.await {
                    tracing::warn!(component = name, error = %e, "Run loop ended abnormally");
                }
            }
        };
        if tokio::time::timeout(grace, joined).await.is_err() {
            tracing::warn!(
                grace_secs = grace.as_secs_f64(),
                "Timed out waiting for run loops to exit"
            );
        }
    }

    fn unwind(&mut self) {
        if !self.query_token.is_cancelled() {
            tracing::debug!("Cancelling in-flight queries");
            self.query_token.cancel();
        }

        while let Some((name, stop)) = self.stops.pop() {
            match stop() {
                Ok(()) => {
                    metrics::emit_component_stop(name, "ok");
                    tracing::info!(component = name, "Stopped");
                }
                Err(e) => {
                    metrics::emit_component_stop(name, "error");
                    tracing::error!(component = name, error = %e, "Error stopping component");
                }
            }
        }
    }
}

impl Drop for LifecycleSequencer {
    fn drop(&mut self) {
        if !self.stops.is_empty() {
            tracing::warn!(
                remaining = ?self.started(),
                "Sequencer dropped without shutdown, unwinding"
            );
            self.unwind();
        }
    }
}
