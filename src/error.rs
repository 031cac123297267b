//! Fatal startup errors.

use thiserror::Error;

use crate::reload::ReloadError;
use crate::storage::{InvalidStorageEngine, StorageError};

/// Anything that aborts the process before it begins serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    InvalidStorageEngine(#[from] InvalidStorageEngine),

    #[error("error opening storage: {0}")]
    Storage(#[from] StorageError),

    #[error("error loading config: {0}")]
    InitialConfig(#[source] ReloadError),

    #[error("failed to install signal handler: {0}")]
    Signals(#[from] std::io::Error),
}

impl StartupError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
