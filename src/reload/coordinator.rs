//! The reload protocol and its single event loop.

use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwapOption;
use tokio::sync::mpsc;

use crate::config::{ConfigSource, MonitorConfig};
use crate::reload::gate::GateWaiter;
use crate::reload::reloadable::Reloadables;
use crate::reload::status::ReloadStatusSink;
use crate::reload::trigger::ReloadTrigger;
use crate::reload::ReloadError;

/// Serializes every configuration reload into one protocol.
///
/// Owns the reloadable list. After the initial [`reload`](Self::reload) it is
/// moved into [`run`](Self::run), which is then the only caller of
/// `apply_config` for the rest of the process.
pub struct ReloadCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn ConfigSource>,
    reloadables: Reloadables,
    status: Arc<dyn ReloadStatusSink>,
    current: ArcSwapOption<MonitorConfig>,
}

impl ReloadCoordinator {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        reloadables: Reloadables,
        status: Arc<dyn ReloadStatusSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                reloadables,
                status,
                current: ArcSwapOption::empty(),
            }),
        }
    }

    /// The most recently parsed configuration, whether or not every
    /// reloadable accepted it.
    pub fn current_config(&self) -> Option<Arc<MonitorConfig>> {
        self.inner.current.load_full()
    }

    pub fn reloadables(&self) -> &Reloadables {
        &self.inner.reloadables
    }

    /// Load the configuration and apply it to every reloadable, blocking the
    /// calling thread.
    pub fn reload(&self) -> Result<(), ReloadError> {
        self.inner.reload()
    }

    /// Same as [`reload`](Self::reload), run on the blocking pool so file I/O
    /// and subsystem work never stall the async workers.
    pub async fn reload_blocking(&self) -> Result<(), ReloadError> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.reload())
            .await
            .map_err(|e| {
                // The status sink was never reached; record the failure here.
                self.inner.status.record_failure();
                ReloadError::Panicked(e.to_string())
            })?
    }

    /// Reload event loop.
    ///
    /// Waits for the startup gate, then handles triggers one at a time in
    /// arrival order. Returns only once every producer is gone, or straight
    /// away if the gate was dropped without opening.
    pub async fn run(self, gate: GateWaiter, mut triggers: mpsc::UnboundedReceiver<ReloadTrigger>) {
        if !gate.wait().await {
            tracing::debug!("Startup aborted before the reload gate opened");
            return;
        }
        tracing::info!(
            reloadables = ?self.inner.reloadables,
            "Reload handler accepting triggers"
        );

        while let Some(trigger) = triggers.recv().await {
            let source = trigger.source();
            tracing::info!(trigger = source, "Reload triggered");

            match trigger {
                ReloadTrigger::Signal => {
                    if let Err(e) = self.reload_blocking().await {
                        tracing::error!(trigger = source, error = %e, "Error reloading config");
                    }
                }
                ReloadTrigger::Request { respond_to } => {
                    let outcome = self.reload_blocking().await;
                    if let Err(e) = &outcome {
                        tracing::error!(trigger = source, error = %e, "Error reloading config");
                    }
                    if respond_to.send(outcome).is_err() {
                        tracing::debug!("Reload requester went away before the outcome was delivered");
                    }
                }
            }
        }

        tracing::debug!("Reload trigger queue closed, reload handler exiting");
    }
}

impl Inner {
    fn reload(&self) -> Result<(), ReloadError> {
        let location = self.source.describe();
        tracing::info!(source = %location, "Loading configuration");

        let result = self.apply(location);
        match &result {
            Ok(()) => self.status.record_success(SystemTime::now()),
            Err(_) => self.status.record_failure(),
        }
        result
    }

    fn apply(&self, location: String) -> Result<(), ReloadError> {
        let config = match self.source.load() {
            Ok(config) => Arc::new(config),
            Err(error) => return Err(ReloadError::Load { location, error }),
        };
        self.current.store(Some(config.clone()));

        let mut failed = Vec::new();
        for reloadable in self.reloadables.iter() {
            if let Err(e) = reloadable.apply_config(&config) {
                tracing::error!(
                    reloadable = reloadable.name(),
                    error = %e,
                    "Failed to apply configuration"
                );
                failed.push(reloadable.name().to_string());
            }
        }

        if failed.is_empty() {
            tracing::info!(source = %location, "Completed loading of configuration");
            Ok(())
        } else {
            Err(ReloadError::Apply { location, failed })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::reload::reloadable::{ApplyError, Reloadable};
    use crate::reload::status::ReloadStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource;

    impl ConfigSource for FixedSource {
        fn load(&self) -> Result<MonitorConfig, ConfigError> {
            Ok(MonitorConfig::default())
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    struct Counting {
        name: &'static str,
        calls: AtomicUsize,
        fail: bool,
    }

    impl Reloadable for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn apply_config(&self, _config: &Arc<MonitorConfig>) -> Result<(), ApplyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("rejected".into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_failure_does_not_short_circuit() {
        let first = Arc::new(Counting { name: "first", calls: AtomicUsize::new(0), fail: true });
        let second = Arc::new(Counting { name: "second", calls: AtomicUsize::new(0), fail: false });

        let mut reloadables = Reloadables::new();
        reloadables.register(first.clone()).register(second.clone());
        let status = Arc::new(ReloadStatus::new());
        let coordinator = ReloadCoordinator::new(Arc::new(FixedSource), reloadables, status.clone());

        let err = coordinator.reload().unwrap_err();
        assert!(matches!(err, ReloadError::Apply { ref failed, .. } if failed == &["first"]));
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
        assert!(!status.last_reload_successful());
        assert!(coordinator.current_config().is_some());
    }
}
