//! Alert notifier.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::{AlertmanagerConfig, MonitorConfig};
use crate::lifecycle::Service;
use crate::reload::{ApplyError, Reloadable};

pub const METRIC_ALERTMANAGERS: &str = "monitord_notifier_alertmanagers";

/// Holds the alertmanager set alerts are dispatched to.
#[derive(Debug, Default)]
pub struct Notifier {
    alertmanagers: ArcSwap<Vec<AlertmanagerConfig>>,
    stop: CancellationToken,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alertmanagers(&self) -> Arc<Vec<AlertmanagerConfig>> {
        self.alertmanagers.load_full()
    }
}

impl Reloadable for Notifier {
    fn name(&self) -> &str {
        "notifier"
    }

    fn apply_config(&self, config: &Arc<MonitorConfig>) -> Result<(), ApplyError> {
        let alertmanagers = &config.alerting.alertmanagers;
        if let Some(empty) = alertmanagers.iter().position(|am| am.targets.is_empty()) {
            return Err(format!("alertmanager group {empty} has no targets").into());
        }

        metrics::gauge!(METRIC_ALERTMANAGERS).set(alertmanagers.len() as f64);
        self.alertmanagers.store(Arc::new(alertmanagers.clone()));
        tracing::debug!(alertmanagers = alertmanagers.len(), "Notifier configuration applied");
        Ok(())
    }
}

#[async_trait]
impl Service for Notifier {
    fn name(&self) -> &'static str {
        "notifier"
    }

    async fn run(&self) {
        tracing::info!("Notifier started");
        self.stop.cancelled().await;
        tracing::info!("Notification manager stopped");
    }

    fn stop(&self) {
        tracing::info!("Stopping notification manager...");
        self.stop.cancel();
    }
}
