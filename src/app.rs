//! Wiring of the `monitord` process from its command-line flags.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::config::FileSource;
use crate::error::StartupError;
use crate::http::{ApiServer, AppState};
use crate::lifecycle::signals::{forward_reload_signals, termination_signal};
use crate::lifecycle::{termination_channel, Server, ShutdownArbiter, Subsystems, DEFAULT_SHUTDOWN_GRACE};
use crate::reload::{trigger, ReloadCoordinator, ReloadStatus, Reloadables};
use crate::services::{Notifier, RemoteReader, RemoteWriter, RuleEvaluator, TargetManager};
use crate::storage::StorageEngine;

/// Build every subsystem and the channels between them.
///
/// Signal handlers are installed here, so SIGHUP deliveries arriving before
/// the server runs are queued rather than lost.
pub fn assemble(
    cli: &Cli,
    metrics: Option<PrometheusHandle>,
) -> Result<Server<impl Future<Output = &'static str> + Send>, StartupError> {
    let engine: StorageEngine = cli.storage_engine.parse().map_err(|e| {
        tracing::error!(storage_engine = %cli.storage_engine, "Invalid local storage engine");
        StartupError::InvalidStorageEngine(e)
    })?;
    let storage = engine.build(cli.storage_path.clone());

    let query_token = CancellationToken::new();
    let status = Arc::new(ReloadStatus::new());
    let (requester, triggers) = trigger::channel();
    let (termination, sources) = termination_channel();

    let remote_write = Arc::new(RemoteWriter::new());
    let remote_read = Arc::new(RemoteReader::new());
    let notifier = Arc::new(Notifier::new());
    let base_dir = cli.config_file.parent().unwrap_or(Path::new("."));
    let rule_evaluator = Arc::new(RuleEvaluator::new(
        base_dir,
        notifier.clone(),
        query_token.clone(),
    ));
    let target_manager = Arc::new(TargetManager::new());

    let mut state = AppState::new(requester.clone(), termination, status.clone(), query_token.clone());
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }
    if let Some(token) = cli.web_admin_token.as_deref() {
        state = state.with_admin_token(token);
    }
    let api = Arc::new(ApiServer::new(cli.web_listen_address.clone(), state));

    let mut reloadables = Reloadables::new();
    reloadables
        .register(remote_write.clone())
        .register(remote_read)
        .register(target_manager.clone())
        .register(rule_evaluator.clone())
        .register(api.clone())
        .register(notifier.clone());

    let source = FileSource::new(cli.config_file.clone())
        .with_alertmanager_urls(cli.alertmanager_urls.clone());
    tracing::info!(
        config_file = %cli.config_file.display(),
        storage_engine = engine.as_str(),
        reloadables = ?reloadables.names(),
        "Assembled subsystems"
    );
    let coordinator = ReloadCoordinator::new(Arc::new(source), reloadables, status);

    forward_reload_signals(requester)?;
    let arbiter = ShutdownArbiter::new(termination_signal()?, sources);

    Ok(Server {
        subsystems: Subsystems {
            storage,
            remote_write: Some(remote_write),
            notifier,
            rule_evaluator,
            target_manager,
            api,
        },
        coordinator,
        triggers,
        arbiter,
        query_token,
        shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["monitord"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_storage_engine_is_fatal() {
        let cli = cli(&["--storage-engine", "bogus"]);

        match assemble(&cli, None) {
            Err(err @ StartupError::InvalidStorageEngine(_)) => {
                assert_eq!(err.exit_code(), 1);
                assert!(err.to_string().contains("\"bogus\""));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("assembly succeeded with an unknown storage engine"),
        }
    }

    #[tokio::test]
    async fn test_reloadables_registered_in_dependency_order() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let cli = cli(&["--storage-engine", "none", "--storage-path", data.to_str().unwrap()]);

        let server = assemble(&cli, None).unwrap();

        assert_eq!(
            server.coordinator.reloadables().names(),
            vec!["remote-write", "remote-read", "target-manager", "rule-evaluator", "web", "notifier"]
        );
    }

    #[tokio::test]
    async fn test_alertmanager_flags_reach_loaded_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("monitord.toml");
        std::fs::write(&config_file, "[global]\nevaluation_interval_secs = 30\n").unwrap();
        let cli = cli(&[
            "--config-file",
            config_file.to_str().unwrap(),
            "--storage-engine",
            "none",
            "--alertmanager-url",
            "https://am.example.org/prefix",
        ]);

        let server = assemble(&cli, None).unwrap();
        server.coordinator.reload_blocking().await.unwrap();

        let config = server.coordinator.current_config().unwrap();
        assert_eq!(config.global.evaluation_interval_secs, 30);
        let am = &config.alerting.alertmanagers;
        assert_eq!(am.len(), 1);
        assert_eq!(am[0].scheme, "https");
        assert_eq!(am[0].path_prefix, "/prefix");
        assert_eq!(am[0].targets, vec!["am.example.org:443".to_string()]);
    }
}
