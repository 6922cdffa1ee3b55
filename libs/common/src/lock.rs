//! Advisory whole-file locking shared between workstations
//!
//! Every shared file `foo.txt` is guarded by a sibling `foo.txt.lock`. The
//! lock is taken with a non-blocking attempt that is retried until a
//! deadline, so a stuck peer surfaces as [`StoreError::LockTimeout`] rather
//! than a hang.

use crate::error::{StoreError, StoreResult};
use std::ffi::OsString;
use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Lock acquisition timeout used when no setting overrides it
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Held advisory lock; released on drop
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Path of the lock file guarding `target`
    pub fn lock_path_for(target: &Path) -> PathBuf {
        let mut name = OsString::from(target.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Acquire the exclusive lock for `target`, waiting at most `timeout`
    pub fn acquire(target: &Path, timeout: Duration) -> StoreResult<Self> {
        let path = Self::lock_path_for(target);
        crate::fs::ensure_parent(&path)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock() {
                Ok(()) => {
                    debug!("Acquired lock {}", path.display());
                    return Ok(FileLock { file, path });
                }
                Err(TryLockError::WouldBlock) => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!("Gave up waiting for lock {}", path.display());
                        return Err(StoreError::LockTimeout { path, timeout });
                    }
                    thread::sleep(POLL_INTERVAL.min(deadline - now));
                }
                Err(TryLockError::Error(e)) => return Err(StoreError::io(&path, e)),
            }
        }
    }

    /// Path of the lock file itself
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}
