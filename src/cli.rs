//! Command-line flags of the `monitord` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::observability::logging::LogFormat;

#[derive(Debug, Clone, Parser)]
#[command(name = "monitord", version, about = "Monitoring server", long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(long, default_value = "monitord.toml")]
    pub config_file: PathBuf,

    /// Local storage engine: `persisted` or `none`.
    #[arg(long, default_value = "persisted")]
    pub storage_engine: String,

    /// Base path for metrics storage.
    #[arg(long, default_value = "data/")]
    pub storage_path: PathBuf,

    /// Address to listen on for the web interface and API.
    #[arg(long, default_value = "0.0.0.0:9090")]
    pub web_listen_address: String,

    /// Bearer token required by /-/reload and /-/quit.
    #[arg(long, env = "MONITORD_ADMIN_TOKEN")]
    pub web_admin_token: Option<String>,

    /// Alertmanager to send notifications to, in addition to the
    /// configuration file. Repeatable.
    #[arg(long = "alertmanager-url")]
    pub alertmanager_urls: Vec<String>,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
