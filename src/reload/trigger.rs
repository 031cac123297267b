//! Reload triggers and the handle producers use to submit them.

use tokio::sync::{mpsc, oneshot};

use crate::observability::metrics;
use crate::reload::ReloadError;

/// Why a reload was requested.
#[derive(Debug)]
pub enum ReloadTrigger {
    /// OS reload signal. Fire-and-forget.
    Signal,
    /// Administrative request; the outcome is sent back on `respond_to`.
    Request {
        respond_to: oneshot::Sender<Result<(), ReloadError>>,
    },
}

impl ReloadTrigger {
    pub fn source(&self) -> &'static str {
        match self {
            ReloadTrigger::Signal => "signal",
            ReloadTrigger::Request { .. } => "request",
        }
    }
}

/// Create the merged trigger queue.
///
/// The queue is unbounded so triggers that arrive before the coordinator's
/// gate opens are held rather than dropped.
pub fn channel() -> (ReloadRequester, mpsc::UnboundedReceiver<ReloadTrigger>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ReloadRequester { tx }, rx)
}

/// Producer side of the trigger queue. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ReloadRequester {
    tx: mpsc::UnboundedSender<ReloadTrigger>,
}

impl ReloadRequester {
    /// Queue a signal-sourced reload.
    pub fn signal(&self) -> Result<(), ReloadError> {
        self.submit(ReloadTrigger::Signal)
    }

    /// Queue a request-sourced reload and wait for its outcome.
    pub async fn request(&self) -> Result<(), ReloadError> {
        let (respond_to, response) = oneshot::channel();
        self.submit(ReloadTrigger::Request { respond_to })?;
        response.await.map_err(|_| ReloadError::CoordinatorClosed)?
    }

    fn submit(&self, trigger: ReloadTrigger) -> Result<(), ReloadError> {
        metrics::emit_reload_trigger(trigger.source());
        self.tx
            .send(trigger)
            .map_err(|_| ReloadError::CoordinatorClosed)
    }
}
