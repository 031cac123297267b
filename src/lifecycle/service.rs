//! Contract of a long-running subsystem.

use async_trait::async_trait;

/// A subsystem with its own run loop.
///
/// `run` is spawned as an independent task and never awaited by the
/// sequencer; `stop` is a direct call made during teardown that must return
/// quickly and make `run` finish.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run(&self);

    fn stop(&self);
}
