//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitord_config_last_reload_successful` (gauge): 1 if the last reload succeeded
//! - `monitord_config_last_reload_success_timestamp_seconds` (gauge): unix time of last success
//! - `monitord_config_reload_triggers_total` (counter): triggers by source
//! - `monitord_shutdown_initiated_total` (counter): termination by reason
//! - `monitord_component_stop_total` (counter): teardown steps by component, result

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const METRIC_RELOAD_SUCCESSFUL: &str = "monitord_config_last_reload_successful";
pub const METRIC_RELOAD_SUCCESS_TIMESTAMP: &str =
    "monitord_config_last_reload_success_timestamp_seconds";
pub const METRIC_RELOAD_TRIGGERS: &str = "monitord_config_reload_triggers_total";
pub const METRIC_SHUTDOWN_INITIATED: &str = "monitord_shutdown_initiated_total";
pub const METRIC_COMPONENT_STOP: &str = "monitord_component_stop_total";

/// Install the global Prometheus recorder. The handle renders `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Describe the reload gauges. Called once storage is open, never before.
pub fn describe_reload_metrics() {
    metrics::describe_gauge!(
        METRIC_RELOAD_SUCCESSFUL,
        "Whether the last configuration reload attempt was successful."
    );
    metrics::describe_gauge!(
        METRIC_RELOAD_SUCCESS_TIMESTAMP,
        metrics::Unit::Seconds,
        "Timestamp of the last successful configuration reload."
    );
    metrics::describe_counter!(
        METRIC_RELOAD_TRIGGERS,
        "Configuration reload triggers received, by source."
    );
}

pub fn set_reload_status(successful: bool, success_timestamp: Option<i64>) {
    metrics::gauge!(METRIC_RELOAD_SUCCESSFUL).set(if successful { 1.0 } else { 0.0 });
    if let Some(ts) = success_timestamp {
        metrics::gauge!(METRIC_RELOAD_SUCCESS_TIMESTAMP).set(ts as f64);
    }
}

pub fn emit_reload_trigger(source: &'static str) {
    metrics::counter!(METRIC_RELOAD_TRIGGERS, "source" => source).increment(1);
}

pub fn emit_shutdown_initiated(reason: &'static str) {
    metrics::counter!(METRIC_SHUTDOWN_INITIATED, "reason" => reason).increment(1);
}

pub fn emit_component_stop(component: &str, result: &'static str) {
    metrics::counter!(
        METRIC_COMPONENT_STOP,
        "component" => component.to_string(),
        "result" => result
    )
    .increment(1);
}
