//! On-disk storage directory guarded by a lock file.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::storage::{Storage, StorageError};

const LOCK_FILE: &str = "lock";

pub const METRIC_STORAGE_OPEN: &str = "monitord_local_storage_open";

#[cfg(unix)]
type DirLock = nix::fcntl::Flock<File>;

#[cfg(not(unix))]
type DirLock = File;

/// Take an exclusive, non-blocking lock on `file`. `None` if another holder
/// has it.
#[cfg(unix)]
fn try_lock(file: File) -> io::Result<Option<DirLock>> {
    use nix::errno::Errno;
    use nix::fcntl::{Flock, FlockArg};

    match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(lock) => Ok(Some(lock)),
        Err((_, errno)) if errno == Errno::EWOULDBLOCK => Ok(None),
        Err((_, errno)) => Err(errno.into()),
    }
}

#[cfg(not(unix))]
fn try_lock(file: File) -> io::Result<Option<DirLock>> {
    match file.try_lock() {
        Ok(()) => Ok(Some(file)),
        Err(fs::TryLockError::WouldBlock) => Ok(None),
        Err(fs::TryLockError::Error(e)) => Err(e),
    }
}

/// Local storage rooted at a data directory.
///
/// Opening creates the directory and takes an OS lock on its lock file. The
/// lock lives as long as the handle: `stop`, dropping the storage, or the
/// process dying all release it. The file itself stays on disk.
pub struct LocalStorage {
    path: PathBuf,
    lock: Mutex<Option<DirLock>>,
}

impl LocalStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.held().is_some()
    }

    fn held(&self) -> MutexGuard<'_, Option<DirLock>> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_path(&self) -> PathBuf {
        self.path.join(LOCK_FILE)
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Storage for LocalStorage {
    fn name(&self) -> &'static str {
        "local-storage"
    }

    fn start(&self) -> Result<(), StorageError> {
        let mut held = self.held();
        if held.is_some() {
            return Err(StorageError::Locked(self.path.clone()));
        }

        fs::create_dir_all(&self.path).map_err(|e| self.io_error(e))?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| self.io_error(e))?;

        match try_lock(file).map_err(|e| self.io_error(e))? {
            Some(lock) => *held = Some(lock),
            None => return Err(StorageError::Locked(self.path.clone())),
        }

        tracing::info!(path = %self.path.display(), "Local storage opened");
        Ok(())
    }

    fn stop(&self) -> Result<(), StorageError> {
        let lock = self.held().take().ok_or(StorageError::NotOpen)?;
        // Closing the handle releases the lock.
        drop(lock);
        metrics::gauge!(METRIC_STORAGE_OPEN).set(0.0);
        tracing::info!(path = %self.path.display(), "Local storage closed");
        Ok(())
    }

    fn register_metrics(&self) {
        metrics::describe_gauge!(METRIC_STORAGE_OPEN, "Whether local storage is open.");
        metrics::gauge!(METRIC_STORAGE_OPEN).set(if self.is_open() { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop_manages_lock() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("data"));

        storage.start().unwrap();
        assert!(storage.is_open());
        assert!(dir.path().join("data").join(LOCK_FILE).exists());

        storage.stop().unwrap();
        assert!(!storage.is_open());

        let next = LocalStorage::new(dir.path().join("data"));
        next.start().unwrap();
        next.stop().unwrap();
    }

    #[test]
    fn test_second_instance_is_locked_out() {
        let dir = tempfile::tempdir().unwrap();
        let first = LocalStorage::new(dir.path().to_path_buf());
        let second = LocalStorage::new(dir.path().to_path_buf());

        first.start().unwrap();
        assert!(matches!(second.start(), Err(StorageError::Locked(_))));
        assert!(matches!(second.stop(), Err(StorageError::NotOpen)));
        first.stop().unwrap();
    }

    #[test]
    fn test_lock_released_when_storage_dropped_without_stop() {
        let dir = tempfile::tempdir().unwrap();
        let crashed = LocalStorage::new(dir.path().to_path_buf());
        crashed.start().unwrap();
        drop(crashed);

        // A stale lock file on disk must not keep the next process out.
        assert!(dir.path().join(LOCK_FILE).exists());
        let restarted = LocalStorage::new(dir.path().to_path_buf());
        restarted.start().unwrap();
        assert!(restarted.is_open());
        restarted.stop().unwrap();
    }

    #[test]
    fn test_double_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf());
        storage.start().unwrap();
        assert!(matches!(storage.start(), Err(StorageError::Locked(_))));
        storage.stop().unwrap();
    }
}
