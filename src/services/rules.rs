//! Rule evaluator.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::lifecycle::Service;
use crate::reload::{ApplyError, Reloadable};
use crate::services::{run_every, Notifier};

pub const METRIC_EVALUATIONS: &str = "monitord_rule_evaluations_total";
pub const METRIC_EVALUATIONS_SKIPPED: &str = "monitord_rule_evaluations_skipped_total";

#[derive(Debug)]
struct RuleSet {
    files: Vec<PathBuf>,
    interval: Duration,
}

/// Periodically evaluates the configured rule files.
///
/// Evaluation runs queries through the shared query token; once that token is
/// cancelled no new evaluation starts.
pub struct RuleEvaluator {
    rules: ArcSwap<RuleSet>,
    base_dir: PathBuf,
    notifier: Arc<Notifier>,
    query_token: CancellationToken,
    stop: CancellationToken,
    reloaded: Notify,
    evaluations: AtomicU64,
}

impl RuleEvaluator {
    /// Relative rule file paths are resolved against `base_dir`.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        notifier: Arc<Notifier>,
        query_token: CancellationToken,
    ) -> Self {
        Self {
            rules: ArcSwap::from_pointee(RuleSet {
                files: Vec::new(),
                interval: Duration::from_secs(60),
            }),
            base_dir: base_dir.into(),
            notifier,
            query_token,
            stop: CancellationToken::new(),
            reloaded: Notify::new(),
            evaluations: AtomicU64::new(0),
        }
    }

    pub fn rule_files(&self) -> Vec<PathBuf> {
        self.rules.load().files.clone()
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn evaluate(&self) {
        if self.query_token.is_cancelled() {
            metrics::counter!(METRIC_EVALUATIONS_SKIPPED).increment(1);
            return;
        }
        let rules = self.rules.load();
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(METRIC_EVALUATIONS).increment(1);
        tracing::debug!(
            rule_files = rules.files.len(),
            alertmanagers = self.notifier.alertmanagers().len(),
            "Evaluated rules"
        );
    }
}

impl Reloadable for RuleEvaluator {
    fn name(&self) -> &str {
        "rule-evaluator"
    }

    fn apply_config(&self, config: &Arc<MonitorConfig>) -> Result<(), ApplyError> {
        let files: Vec<PathBuf> = config.rule_files.iter().map(|f| self.resolve(f)).collect();
        for file in &files {
            if !file.is_file() {
                return Err(format!("error loading rules from {}: no such file", file.display()).into());
            }
        }

        self.rules.store(Arc::new(RuleSet {
            files,
            interval: Duration::from_secs(config.global.evaluation_interval_secs.max(1)),
        }));
        self.reloaded.notify_one();
        Ok(())
    }
}

#[async_trait]
impl Service for RuleEvaluator {
    fn name(&self) -> &'static str {
        "rule-evaluator"
    }

    async fn run(&self) {
        tracing::info!("Rule evaluator started");
        run_every(&self.stop, &self.reloaded, || self.rules.load().interval, || self.evaluate()).await;
        tracing::info!("Rule manager stopped");
    }

    fn stop(&self) {
        tracing::info!("Stopping rule manager...");
        self.stop.cancel();
    }
}
