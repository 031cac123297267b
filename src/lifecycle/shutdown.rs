//! Termination arbitration.

use std::future::Future;

use tokio::sync::mpsc;

use crate::observability::metrics;

/// Why the process is exiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationEvent {
    /// Operator interrupt or terminate signal.
    Signal(&'static str),
    /// Quit requested through the HTTP API.
    Quit,
    /// The HTTP API failed to bind or listen.
    ListenError(String),
}

impl TerminationEvent {
    pub fn reason(&self) -> &'static str {
        match self {
            TerminationEvent::Signal(_) => "signal",
            TerminationEvent::Quit => "quit",
            TerminationEvent::ListenError(_) => "listen_error",
        }
    }

    /// Every termination path tears down gracefully, so all exit 0.
    pub fn exit_code(&self) -> u8 {
        0
    }
}

/// Create the channels subsystems use to ask the process to exit.
pub fn termination_channel() -> (TerminationSenders, TerminationSources) {
    let (quit_tx, quit_rx) = mpsc::channel(1);
    let (listen_tx, listen_rx) = mpsc::channel(1);
    (
        TerminationSenders {
            quit: quit_tx,
            listen_error: listen_tx,
        },
        TerminationSources {
            quit: quit_rx,
            listen_error: listen_rx,
        },
    )
}

/// Held by the HTTP API.
#[derive(Clone, Debug)]
pub struct TerminationSenders {
    quit: mpsc::Sender<()>,
    listen_error: mpsc::Sender<std::io::Error>,
}

impl TerminationSenders {
    /// Ask for a graceful exit. Repeated requests collapse into one.
    pub fn request_quit(&self) {
        let _ = self.quit.try_send(());
    }

    /// Report that the API could not bind its listener.
    pub fn report_listen_error(&self, err: std::io::Error) {
        let _ = self.listen_error.try_send(err);
    }
}

/// Receiving ends consumed by the [`ShutdownArbiter`].
#[derive(Debug)]
pub struct TerminationSources {
    quit: mpsc::Receiver<()>,
    listen_error: mpsc::Receiver<std::io::Error>,
}

/// Races the termination sources; the first one to fire wins.
///
/// `wait` consumes the arbiter, so exactly one event is ever produced and the
/// caller drives exactly one teardown. Anything firing later is ignored.
pub struct ShutdownArbiter<S> {
    signal: S,
    sources: TerminationSources,
}

impl<S> ShutdownArbiter<S>
where
    S: Future<Output = &'static str> + Send,
{
    pub fn new(signal: S, sources: TerminationSources) -> Self {
        Self { signal, sources }
    }

    /// Block until a termination source fires.
    pub async fn wait(self) -> TerminationEvent {
        let ShutdownArbiter {
            signal,
            mut sources,
        } = self;

        let event = tokio::select! {
            name = signal => TerminationEvent::Signal(name),
            Some(()) = sources.quit.recv() => TerminationEvent::Quit,
            Some(err) = sources.listen_error.recv() => TerminationEvent::ListenError(err.to_string()),
        };

        metrics::emit_shutdown_initiated(event.reason());
        match &event {
            TerminationEvent::Signal(name) => {
                tracing::warn!(signal = name, "Received termination signal, exiting gracefully...");
            }
            TerminationEvent::Quit => {
                tracing::warn!("Received termination request via web service, exiting gracefully...");
            }
            TerminationEvent::ListenError(err) => {
                tracing::error!(error = %err, "Error starting web server, exiting gracefully...");
            }
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_quit_wins_over_pending_signal() {
        let (senders, sources) = termination_channel();
        senders.request_quit();
        senders.request_quit();

        let arbiter = ShutdownArbiter::new(std::future::pending::<&'static str>(), sources);
        assert_eq!(arbiter.wait().await, TerminationEvent::Quit);
    }

    #[tokio::test]
    async fn test_listen_error_is_reported() {
        let (senders, sources) = termination_channel();
        senders.report_listen_error(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "address in use",
        ));

        let event = ShutdownArbiter::new(std::future::pending::<&'static str>(), sources)
            .wait()
            .await;
        assert_eq!(event, TerminationEvent::ListenError("address in use".into()));
        assert_eq!(event.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_waits_while_sources_are_closed() {
        let (senders, sources) = termination_channel();
        drop(senders);

        let arbiter = ShutdownArbiter::new(
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                "SIGTERM"
            },
            sources,
        );
        assert_eq!(arbiter.wait().await, TerminationEvent::Signal("SIGTERM"));
    }
}
