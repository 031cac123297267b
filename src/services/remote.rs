//! Remote read and remote write bridges.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::{MonitorConfig, RemoteEndpointConfig};
use crate::lifecycle::Service;
use crate::reload::{ApplyError, Reloadable};
use crate::services::validate_endpoint;

fn validate_all(endpoints: &[RemoteEndpointConfig]) -> Result<(), ApplyError> {
    for endpoint in endpoints {
        validate_endpoint(&endpoint.url)?;
    }
    Ok(())
}

/// Queue forwarding appended samples to the remote write endpoints.
#[derive(Debug, Default)]
pub struct RemoteWriter {
    endpoints: ArcSwap<Vec<RemoteEndpointConfig>>,
    stop: CancellationToken,
}

impl RemoteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoints(&self) -> Arc<Vec<RemoteEndpointConfig>> {
        self.endpoints.load_full()
    }
}

impl Reloadable for RemoteWriter {
    fn name(&self) -> &str {
        "remote-write"
    }

    fn apply_config(&self, config: &Arc<MonitorConfig>) -> Result<(), ApplyError> {
        validate_all(&config.remote_write)?;
        self.endpoints.store(Arc::new(config.remote_write.clone()));
        Ok(())
    }
}

#[async_trait]
impl Service for RemoteWriter {
    fn name(&self) -> &'static str {
        "remote-write"
    }

    async fn run(&self) {
        tracing::info!(endpoints = self.endpoints.load().len(), "Remote write started");
        self.stop.cancelled().await;
        tracing::info!("Remote write stopped");
    }

    fn stop(&self) {
        self.stop.cancel();
    }
}

/// Client for the remote read endpoints; reloadable only, nothing to run.
#[derive(Debug, Default)]
pub struct RemoteReader {
    endpoints: ArcSwap<Vec<RemoteEndpointConfig>>,
}

impl RemoteReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoints(&self) -> Arc<Vec<RemoteEndpointConfig>> {
        self.endpoints.load_full()
    }
}

impl Reloadable for RemoteReader {
    fn name(&self) -> &str {
        "remote-read"
    }

    fn apply_config(&self, config: &Arc<MonitorConfig>) -> Result<(), ApplyError> {
        validate_all(&config.remote_read)?;
        self.endpoints.store(Arc::new(config.remote_read.clone()));
        Ok(())
    }
}
