//! One-shot startup gate.

use tokio::sync::oneshot;

/// Create a closed gate and the waiter blocked on it.
pub fn gate() -> (StartupGate, GateWaiter) {
    let (tx, rx) = oneshot::channel();
    (StartupGate { tx }, GateWaiter { rx })
}

/// Opened exactly once, after every subsystem has been started.
#[derive(Debug)]
pub struct StartupGate {
    tx: oneshot::Sender<()>,
}

impl StartupGate {
    pub fn open(self) {
        // A dropped waiter means the reload loop is already gone.
        let _ = self.tx.send(());
    }
}

/// Held by the reload loop until startup completes.
#[derive(Debug)]
pub struct GateWaiter {
    rx: oneshot::Receiver<()>,
}

impl GateWaiter {
    /// Resolves `true` when the gate opens, `false` if it was dropped unopened
    /// (startup aborted).
    pub async fn wait(self) -> bool {
        self.rx.await.is_ok()
    }
}
