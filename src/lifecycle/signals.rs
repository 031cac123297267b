//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are installed eagerly so installation failure is a startup error
//! - SIGHUP triggers config reload, not shutdown

use std::future::Future;
use std::io;

use tokio::task::JoinHandle;

use crate::reload::ReloadRequester;

/// Install SIGINT/SIGTERM handlers; the returned future resolves with the
/// name of the first one delivered.
#[cfg(unix)]
pub fn termination_signal() -> io::Result<impl Future<Output = &'static str> + Send> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        }
    })
}

#[cfg(not(unix))]
pub fn termination_signal() -> io::Result<impl Future<Output = &'static str> + Send> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending().await
            }
        }
    })
}

/// Install the SIGHUP handler and forward every delivery as a signal-sourced
/// reload trigger.
///
/// Installed before startup completes; triggers queue until the reload gate
/// opens.
#[cfg(unix)]
pub fn forward_reload_signals(requester: ReloadRequester) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hup.recv().await.is_some() {
            tracing::info!("Received SIGHUP");
            if requester.signal().is_err() {
                break;
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn forward_reload_signals(requester: ReloadRequester) -> io::Result<JoinHandle<()>> {
    drop(requester);
    Ok(tokio::spawn(async {}))
}
