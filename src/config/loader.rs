//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use crate::config::schema::{AlertmanagerConfig, MonitorConfig};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid alertmanager URL {url:?}: {reason}")]
    AlertmanagerUrl { url: String, reason: String },
}

/// Where configuration snapshots come from.
///
/// `load` is called fresh on every reload; implementations must not cache.
pub trait ConfigSource: Send + Sync {
    /// Produce a new snapshot.
    fn load(&self) -> Result<MonitorConfig, ConfigError>;

    /// Human-readable identity used in reload diagnostics.
    fn describe(&self) -> String;
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: MonitorConfig = toml::from_str(&content)?;
    Ok(config)
}

/// A TOML file on disk, plus alertmanagers given on the command line.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    alertmanager_urls: Vec<String>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            alertmanager_urls: Vec::new(),
        }
    }

    /// Alertmanager URLs appended to every loaded configuration.
    pub fn with_alertmanager_urls(mut self, urls: Vec<String>) -> Self {
        self.alertmanager_urls = urls;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<MonitorConfig, ConfigError> {
        let mut config = load_config(&self.path)?;
        for raw in &self.alertmanager_urls {
            let am = parse_alertmanager_url(raw)?;
            config.alerting.alertmanagers.push(am);
        }
        Ok(config)
    }

    fn describe(&self) -> String {
        format!("config-file={}", self.path.display())
    }
}

/// Turn a URL such as `https://am.example.org:9093/prefix` into an alertmanager entry.
pub fn parse_alertmanager_url(raw: &str) -> Result<AlertmanagerConfig, ConfigError> {
    let invalid = |reason: String| ConfigError::AlertmanagerUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other:?}"))),
    }
    let host = url
        .host_str()
        .ok_or_else(|| invalid("missing host".to_string()))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| invalid("missing port".to_string()))?;

    Ok(AlertmanagerConfig {
        scheme: url.scheme().to_string(),
        path_prefix: url.path().trim_end_matches('/').to_string(),
        targets: vec![format!("{host}:{port}")],
        timeout_secs: 10,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
rule_files = ["alerts.rules"]

[global]
evaluation_interval_secs = 15

[[scrape_configs]]
job_name = "node"
targets = ["localhost:9100"]
"#
        )
        .unwrap();

        let config = FileSource::new(file.path()).load().unwrap();
        assert_eq!(config.global.evaluation_interval_secs, 15);
        assert_eq!(config.global.scrape_interval_secs, 60);
        assert_eq!(config.rule_files, vec!["alerts.rules".to_string()]);
        assert_eq!(config.scrape_configs[0].metrics_path, "/metrics");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = FileSource::new("/nonexistent/monitord.toml").load().unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rule_files = [").unwrap();
        let err = FileSource::new(file.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_alertmanager_urls_are_appended() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = FileSource::new(file.path())
            .with_alertmanager_urls(vec!["https://am.example.org/prefix/".to_string()]);

        let config = source.load().unwrap();
        let am = &config.alerting.alertmanagers[0];
        assert_eq!(am.scheme, "https");
        assert_eq!(am.path_prefix, "/prefix");
        assert_eq!(am.targets, vec!["am.example.org:443".to_string()]);
    }

    #[test]
    fn test_bad_alertmanager_url_fails_load() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source =
            FileSource::new(file.path()).with_alertmanager_urls(vec!["ftp://am:21".to_string()]);
        assert!(matches!(
            source.load(),
            Err(ConfigError::AlertmanagerUrl { .. })
        ));
    }
}
