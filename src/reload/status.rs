//! Durable reload status signals.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::observability::metrics;

/// Sink for reload outcomes, injected into the coordinator.
pub trait ReloadStatusSink: Send + Sync {
    /// A reload finished with zero failures at `at`.
    fn record_success(&self, at: SystemTime);

    /// A reload failed to load or was rejected by at least one reloadable.
    fn record_failure(&self);
}

/// Last-reload status kept in atomics and mirrored to the metrics recorder.
///
/// Each update is a single store per signal; readers never need a lock.
#[derive(Debug, Default)]
pub struct ReloadStatus {
    successful: AtomicBool,
    success_timestamp: AtomicI64,
}

/// Point-in-time view of [`ReloadStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadStatusSnapshot {
    pub last_reload_successful: bool,
    /// Unix seconds of the last successful reload, `None` before the first one.
    pub last_reload_success_timestamp: Option<i64>,
}

impl ReloadStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_reload_successful(&self) -> bool {
        self.successful.load(Ordering::SeqCst)
    }

    pub fn last_success_timestamp(&self) -> Option<i64> {
        match self.success_timestamp.load(Ordering::SeqCst) {
            0 => None,
            ts => Some(ts),
        }
    }

    pub fn snapshot(&self) -> ReloadStatusSnapshot {
        ReloadStatusSnapshot {
            last_reload_successful: self.last_reload_successful(),
            last_reload_success_timestamp: self.last_success_timestamp(),
        }
    }
}

impl ReloadStatusSink for ReloadStatus {
    fn record_success(&self, at: SystemTime) {
        let ts = at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        self.success_timestamp.store(ts, Ordering::SeqCst);
        self.successful.store(true, Ordering::SeqCst);
        metrics::set_reload_status(true, Some(ts));
    }

    fn record_failure(&self) {
        self.successful.store(false, Ordering::SeqCst);
        metrics::set_reload_status(false, None);
    }
}
