use crate::paths::SheafPaths;
use fs2::FileExt;
use sheaf_core::StackError;
use std::fs::{File, OpenOptions};
use std::time::Duration;

/// Exclusive workspace lock backed by `.sheaf/LOCK`.
/// Automatically released when dropped, on every exit path.
pub struct WorkspaceLock {
    _file: File,
}

impl WorkspaceLock {
    /// Try to acquire the workspace lock once (non-blocking).
    /// Returns `Ok(None)` if another process holds it.
    pub fn try_acquire(paths: &SheafPaths) -> Result<Option<Self>, StackError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)
            .map_err(|e| {
                StackError::Storage(format!(
                    "cannot open lock file {}: {e}",
                    paths.lock_file.display()
                ))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { _file: file })),
            Err(_) => Ok(None),
        }
    }

    /// Acquire the lock, retrying up to `attempts` times with `delay` between
    /// attempts. Fails with [`StackError::Contention`] when the budget runs out.
    pub fn acquire_with_retry(
        paths: &SheafPaths,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, StackError> {
        let attempts = attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(lock) = Self::try_acquire(paths)? {
                return Ok(lock);
            }
            tracing::warn!(
                attempt,
                attempts,
                lock = %paths.lock_file.display(),
                "workspace is locked by another process"
            );
            if attempt < attempts {
                std::thread::sleep(delay);
            }
        }
        Err(StackError::Contention { attempts })
    }

    /// Single attempt.
    pub fn acquire(paths: &SheafPaths) -> Result<Self, StackError> {
        Self::acquire_with_retry(paths, 1, Duration::ZERO)
    }
}
