// src/lock.rs

//! Advisory repository locking
//!
//! Repository mutations and queries are serialized by a lock injected
//! at construction; there is no hidden singleton. Acquisition is a
//! non-blocking attempt: contention surfaces as
//! [`Error::RepositoryBusy`](crate::Error::RepositoryBusy), and release
//! is guaranteed on every exit path through the RAII [`LockGuard`].

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use fs2::FileExt;

use crate::error::{Error, Result};

/// Non-blocking advisory lock taken around repository operations
pub trait RepositoryLock: Send + Sync {
    /// Attempt to acquire the lock without blocking
    fn try_acquire(&self) -> Result<()>;

    /// Release the lock
    fn release(&self);
}

/// Scoped lock ownership; releases on drop
pub struct LockGuard<'a> {
    lock: &'a dyn RepositoryLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// Acquire a lock, returning a guard that releases it when dropped
pub fn acquire(lock: &dyn RepositoryLock) -> Result<LockGuard<'_>> {
    lock.try_acquire()?;
    Ok(LockGuard { lock })
}

/// File-based advisory lock using `flock`-style exclusive locking
///
/// The lock file is created on first acquisition and left in place;
/// only the flock itself is released.
pub struct FileLock {
    path: PathBuf,
    handle: Mutex<Option<File>>,
}

impl FileLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: Mutex::new(None),
        }
    }
}

impl RepositoryLock for FileLock {
    fn try_acquire(&self) -> Result<()> {
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if handle.is_some() {
            return Err(Error::RepositoryBusy(format!(
                "lock already held: {}",
                self.path.display()
            )));
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.path)?;
        file.try_lock_exclusive().map_err(|err| {
            Error::RepositoryBusy(format!("{}: {}", self.path.display(), err))
        })?;
        *handle = Some(file);
        Ok(())
    }

    fn release(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(file) = handle.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let lock = FileLock::new(dir.path().join("repo.lock"));

        let guard = acquire(&lock).unwrap();
        drop(guard);

        // Reacquirable after release
        let guard = acquire(&lock).unwrap();
        drop(guard);
    }

    #[test]
    fn test_contention_is_busy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repo.lock");
        let first = FileLock::new(&path);
        let second = FileLock::new(&path);

        let _guard = acquire(&first).unwrap();
        match acquire(&second) {
            Err(Error::RepositoryBusy(_)) => {}
            other => panic!("expected RepositoryBusy, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_reentrant_attempt_is_busy() {
        let dir = TempDir::new().unwrap();
        let lock = FileLock::new(dir.path().join("repo.lock"));
        let _guard = acquire(&lock).unwrap();
        assert!(matches!(
            lock.try_acquire(),
            Err(Error::RepositoryBusy(_))
        ));
    }
}
