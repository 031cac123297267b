use crate::storage::{Storage, StorageError};

/// Storage that keeps nothing locally; samples only reach remote write.
#[derive(Debug, Default)]
pub struct NoopStorage;

impl Storage for NoopStorage {
    fn name(&self) -> &'static str {
        "noop-storage"
    }

    fn start(&self) -> Result<(), StorageError> {
        tracing::info!("Local storage disabled, samples are sent to remote write only");
        Ok(())
    }

    fn stop(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
