//! Target manager.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::config::{MonitorConfig, ScrapeConfig};
use crate::lifecycle::Service;
use crate::reload::{ApplyError, Reloadable};
use crate::services::run_every;

pub const METRIC_TARGETS: &str = "monitord_target_manager_targets";

#[derive(Debug, Default)]
struct ScrapePlan {
    jobs: Vec<ScrapeConfig>,
    interval: Duration,
}

/// Owns the scrape job set.
pub struct TargetManager {
    plan: ArcSwap<ScrapePlan>,
    stop: CancellationToken,
    reloaded: Notify,
}

impl Default for TargetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetManager {
    pub fn new() -> Self {
        Self {
            plan: ArcSwap::from_pointee(ScrapePlan {
                jobs: Vec::new(),
                interval: Duration::from_secs(60),
            }),
            stop: CancellationToken::new(),
            reloaded: Notify::new(),
        }
    }

    pub fn job_names(&self) -> Vec<String> {
        self.plan.load().jobs.iter().map(|j| j.job_name.clone()).collect()
    }

    fn sync_targets(&self) {
        let plan = self.plan.load();
        let targets: usize = plan.jobs.iter().map(|j| j.targets.len()).sum();
        metrics::gauge!(METRIC_TARGETS).set(targets as f64);
        tracing::debug!(jobs = plan.jobs.len(), targets, "Target set synced");
    }
}

impl Reloadable for TargetManager {
    fn name(&self) -> &str {
        "target-manager"
    }

    fn apply_config(&self, config: &Arc<MonitorConfig>) -> Result<(), ApplyError> {
        let mut seen = HashSet::new();
        for job in &config.scrape_configs {
            if !seen.insert(job.job_name.as_str()) {
                return Err(format!("found multiple scrape configs with job name {:?}", job.job_name).into());
            }
        }

        self.plan.store(Arc::new(ScrapePlan {
            jobs: config.scrape_configs.clone(),
            interval: Duration::from_secs(config.global.scrape_interval_secs.max(1)),
        }));
        self.sync_targets();
        self.reloaded.notify_one();
        Ok(())
    }
}

#[async_trait]
impl Service for TargetManager {
    fn name(&self) -> &'static str {
        "target-manager"
    }

    async fn run(&self) {
        tracing::info!("Target manager started");
        run_every(&self.stop, &self.reloaded, || self.plan.load().interval, || self.sync_targets()).await;
        tracing::info!("Target manager stopped");
    }

    fn stop(&self) {
        tracing::info!("Stopping target manager...");
        self.stop.cancel();
    }
}
