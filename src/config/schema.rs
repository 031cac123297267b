//! Configuration schema definitions.
//!
//! This module defines the configuration snapshot handed to every reloadable
//! subsystem. All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the monitoring server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Settings shared by every job and rule group.
    pub global: GlobalConfig,

    /// Paths of rule files evaluated by the rule evaluator.
    pub rule_files: Vec<String>,

    /// Scrape job definitions.
    pub scrape_configs: Vec<ScrapeConfig>,

    /// Alertmanager endpoints for the notifier.
    pub alerting: AlertingConfig,

    /// Remote write endpoints.
    pub remote_write: Vec<RemoteEndpointConfig>,

    /// Remote read endpoints.
    pub remote_read: Vec<RemoteEndpointConfig>,
}

/// Global defaults.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default scrape interval in seconds.
    pub scrape_interval_secs: u64,

    /// Default scrape timeout in seconds.
    pub scrape_timeout_secs: u64,

    /// Rule evaluation interval in seconds.
    pub evaluation_interval_secs: u64,

    /// Labels attached to every series and alert leaving this server.
    pub external_labels: BTreeMap<String, String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            scrape_interval_secs: 60,
            scrape_timeout_secs: 10,
            evaluation_interval_secs: 60,
            external_labels: BTreeMap::new(),
        }
    }
}

/// A single scrape job.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScrapeConfig {
    /// Job name, unique across the file.
    pub job_name: String,

    /// Per-job override of the global scrape interval.
    #[serde(default)]
    pub scrape_interval_secs: Option<u64>,

    /// HTTP path to scrape.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Static targets (`host:port`).
    #[serde(default)]
    pub targets: Vec<String>,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

/// Alerting section.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AlertingConfig {
    pub alertmanagers: Vec<AlertmanagerConfig>,
}

/// One alertmanager group.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AlertmanagerConfig {
    /// `http` or `https`.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Path prefix prepended to the alerts API path.
    #[serde(default)]
    pub path_prefix: String,

    /// Alertmanager addresses (`host:port`).
    #[serde(default)]
    pub targets: Vec<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_alertmanager_timeout")]
    pub timeout_secs: u64,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_alertmanager_timeout() -> u64 {
    10
}

/// A remote read or remote write endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RemoteEndpointConfig {
    /// Endpoint URL.
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout_secs: u64,
}

fn default_remote_timeout() -> u64 {
    30
}
