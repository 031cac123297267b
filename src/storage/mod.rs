//! Local storage engines.
//!
//! # Responsibilities
//! - Select the engine named on the command line
//! - Open before anything else starts, close after everything else stopped
//! - Expose self-metrics only once open
//!
//! The time-series engine itself lives elsewhere; this module owns only the
//! start/stop contract the lifecycle depends on.

pub mod local;
pub mod noop;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

pub use local::LocalStorage;
pub use noop::NoopStorage;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage directory {0} is locked by another process")]
    Locked(PathBuf),

    #[error("storage is not open")]
    NotOpen,
}

/// Start/stop contract of a storage engine.
pub trait Storage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Open the engine. Failure is fatal for the process.
    fn start(&self) -> Result<(), StorageError>;

    /// Close the engine. Failure is logged by the caller.
    fn stop(&self) -> Result<(), StorageError>;

    /// Describe self-metrics. Only called after a successful `start`.
    fn register_metrics(&self) {}
}

/// Engines selectable with `--storage-engine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEngine {
    Persisted,
    None,
}

/// The engine name given on the command line is not one we know.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid local storage engine {0:?}")]
pub struct InvalidStorageEngine(pub String);

impl FromStr for StorageEngine {
    type Err = InvalidStorageEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "persisted" => Ok(StorageEngine::Persisted),
            "none" => Ok(StorageEngine::None),
            other => Err(InvalidStorageEngine(other.to_string())),
        }
    }
}

impl StorageEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageEngine::Persisted => "persisted",
            StorageEngine::None => "none",
        }
    }

    /// Instantiate the engine. Nothing is opened yet.
    pub fn build(self, path: PathBuf) -> Arc<dyn Storage> {
        match self {
            StorageEngine::Persisted => Arc::new(LocalStorage::new(path)),
            StorageEngine::None => Arc::new(NoopStorage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_selection() {
        assert_eq!("persisted".parse::<StorageEngine>(), Ok(StorageEngine::Persisted));
        assert_eq!("none".parse::<StorageEngine>(), Ok(StorageEngine::None));
        assert_eq!(
            "leveldb".parse::<StorageEngine>(),
            Err(InvalidStorageEngine("leveldb".to_string()))
        );
    }

    #[test]
    fn test_invalid_engine_message_names_value() {
        let err = "Persisted".parse::<StorageEngine>().unwrap_err();
        assert_eq!(err.to_string(), "invalid local storage engine \"Persisted\"");
    }
}
