//! Shared mocks for lifecycle and reload integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use monitord::config::{ConfigError, ConfigSource, MonitorConfig};
use monitord::lifecycle::{
    termination_channel, Server, Service, ShutdownArbiter, Subsystems, TerminationSenders,
};
use monitord::reload::{trigger, ApplyError, ReloadCoordinator, ReloadRequester, ReloadStatus, Reloadable, Reloadables};
use monitord::storage::{Storage, StorageError};

/// Ordered record of everything the mocks observed.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Events starting with `prefix`, in order.
    pub fn filtered(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

pub struct RecordingStorage {
    log: EventLog,
    fail_start: bool,
    pub metrics_registered: AtomicBool,
}

impl RecordingStorage {
    pub fn new(log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            log: log.clone(),
            fail_start: false,
            metrics_registered: AtomicBool::new(false),
        })
    }

    pub fn failing(log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            log: log.clone(),
            fail_start: true,
            metrics_registered: AtomicBool::new(false),
        })
    }
}

impl Storage for RecordingStorage {
    fn name(&self) -> &'static str {
        "storage"
    }

    fn start(&self) -> Result<(), StorageError> {
        if self.fail_start {
            return Err(StorageError::Locked("/tmp/monitord-test".into()));
        }
        self.log.push("start:storage");
        Ok(())
    }

    fn stop(&self) -> Result<(), StorageError> {
        self.log.push("stop:storage");
        Ok(())
    }

    fn register_metrics(&self) {
        self.metrics_registered.store(true, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Runs until stopped; records its stop and, optionally, whether the query
/// token was already cancelled at that moment.
pub struct RecordingService {
    name: &'static str,
    log: EventLog,
    stop: CancellationToken,
    queries: Option<CancellationToken>,
    pub runs: AtomicUsize,
}

impl RecordingService {
    pub fn new(name: &'static str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
            stop: CancellationToken::new(),
            queries: None,
            runs: AtomicUsize::new(0),
        })
    }

    pub fn observing_queries(name: &'static str, log: &EventLog, queries: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
            stop: CancellationToken::new(),
            queries: Some(queries),
            runs: AtomicUsize::new(0),
        })
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Service for RecordingService {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("run:{}", self.name));
        self.stop.cancelled().await;
    }

    fn stop(&self) {
        if let Some(queries) = &self.queries {
            self.log
                .push(format!("queries-cancelled:{}", queries.is_cancelled()));
        }
        self.log.push(format!("stop:{}", self.name));
        self.stop.cancel();
    }
}

// ---------------------------------------------------------------------------
// Reload
// ---------------------------------------------------------------------------

/// Records `apply:<name>:begin` / `apply:<name>:end` around an optional delay.
pub struct MockReloadable {
    name: String,
    log: EventLog,
    fail: AtomicBool,
    delay: Duration,
    applied: Mutex<Vec<Arc<MonitorConfig>>>,
}

impl MockReloadable {
    pub fn new(name: &str, log: &EventLog) -> Arc<Self> {
        Self::build(name, log, false, Duration::ZERO)
    }

    pub fn failing(name: &str, log: &EventLog) -> Arc<Self> {
        Self::build(name, log, true, Duration::ZERO)
    }

    pub fn slow(name: &str, log: &EventLog, delay: Duration) -> Arc<Self> {
        Self::build(name, log, false, delay)
    }

    fn build(name: &str, log: &EventLog, fail: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            fail: AtomicBool::new(fail),
            delay,
            applied: Mutex::new(Vec::new()),
        })
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn applied(&self) -> Vec<Arc<MonitorConfig>> {
        self.applied.lock().unwrap().clone()
    }
}

impl Reloadable for MockReloadable {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply_config(&self, config: &Arc<MonitorConfig>) -> Result<(), ApplyError> {
        self.log.push(format!("apply:{}:begin", self.name));
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.applied.lock().unwrap().push(config.clone());
        self.log.push(format!("apply:{}:end", self.name));
        if self.fail.load(Ordering::SeqCst) {
            return Err(format!("{} rejected the configuration", self.name).into());
        }
        Ok(())
    }
}

/// In-memory configuration source. Every load bumps `global.scrape_interval_secs`
/// so successive snapshots are distinguishable.
#[derive(Default)]
pub struct StaticSource {
    fail: AtomicBool,
    loads: AtomicUsize,
    base: MonitorConfig,
}

impl StaticSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_config(base: MonitorConfig) -> Arc<Self> {
        Arc::new(Self {
            base,
            ..Default::default()
        })
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ConfigSource for StaticSource {
    fn load(&self) -> Result<MonitorConfig, ConfigError> {
        let generation = self.loads.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "config file missing",
            )));
        }
        let mut config = self.base.clone();
        config.global.scrape_interval_secs = generation;
        Ok(config)
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

pub fn reloadables(entries: &[Arc<MockReloadable>]) -> Reloadables {
    let mut reloadables = Reloadables::new();
    for entry in entries {
        reloadables.register(entry.clone());
    }
    reloadables
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Handles a test holds onto while a [`Server`] runs.
pub struct Controls {
    pub reload: ReloadRequester,
    pub termination: TerminationSenders,
    pub signal: oneshot::Sender<&'static str>,
    pub status: Arc<ReloadStatus>,
    pub query_token: CancellationToken,
}

/// Standard subsystem set recording into `log`; the rule evaluator observes
/// the query token.
pub fn recording_subsystems(log: &EventLog, storage: Arc<dyn Storage>, query_token: &CancellationToken) -> Subsystems {
    Subsystems {
        storage,
        remote_write: Some(RecordingService::new("remote-write", log)),
        notifier: RecordingService::new("notifier", log),
        rule_evaluator: RecordingService::observing_queries("rule-evaluator", log, query_token.clone()),
        target_manager: RecordingService::new("target-manager", log),
        api: RecordingService::new("web", log),
    }
}

/// Assemble a server whose termination signal is a oneshot the test fires.
pub fn test_server(
    subsystems: impl FnOnce(&CancellationToken) -> Subsystems,
    source: Arc<dyn ConfigSource>,
    reloadables: Reloadables,
) -> (Server<impl Future<Output = &'static str> + Send>, Controls) {
    let query_token = CancellationToken::new();
    let status = Arc::new(ReloadStatus::new());
    let (reload, triggers) = trigger::channel();
    let (termination, sources) = termination_channel();
    let (signal, signal_rx) = oneshot::channel::<&'static str>();

    let arbiter = ShutdownArbiter::new(
        async move {
            match signal_rx.await {
                Ok(name) => name,
                Err(_) => std::future::pending().await,
            }
        },
        sources,
    );

    let server = Server {
        subsystems: subsystems(&query_token),
        coordinator: ReloadCoordinator::new(source, reloadables, status.clone()),
        triggers,
        arbiter,
        query_token: query_token.clone(),
        shutdown_grace: Duration::from_secs(2),
    };

    let controls = Controls {
        reload,
        termination,
        signal,
        status,
        query_token,
    };
    (server, controls)
}

/// Poll `check` until it holds or a second has passed.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
