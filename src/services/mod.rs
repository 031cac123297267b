//! Stand-in collaborators.
//!
//! Each one keeps its slice of the current configuration, rejects slices it
//! cannot use, and runs a loop until stopped. The real scrape, rule,
//! notification and remote-storage engines plug in behind the same
//! [`Service`](crate::lifecycle::Service) and
//! [`Reloadable`](crate::reload::Reloadable) contracts.

pub mod notifier;
pub mod remote;
pub mod rules;
pub mod targets;

use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

pub use notifier::Notifier;
pub use remote::{RemoteReader, RemoteWriter};
pub use rules::RuleEvaluator;
pub use targets::TargetManager;

/// Call `tick` every `interval()` until `stop` is cancelled.
///
/// A notification on `reloaded` abandons the current sleep and starts a new
/// one from the freshly read interval, so a shorter interval applies at once.
pub(crate) async fn run_every<I, T>(stop: &CancellationToken, reloaded: &Notify, interval: I, mut tick: T)
where
    I: Fn() -> Duration,
    T: FnMut(),
{
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = reloaded.notified() => continue,
            _ = tokio::time::sleep(interval()) => tick(),
        }
    }
}

pub(crate) fn validate_endpoint(raw: &str) -> Result<(), String> {
    let url = url::Url::parse(raw).map_err(|e| format!("invalid URL {raw:?}: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("invalid URL {raw:?}: unsupported scheme {other:?}")),
    }
}
