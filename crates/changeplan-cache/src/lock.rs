use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::CacheError;

pub const LOCK_FILE: &str = ".cache.lock";

/// Contents of the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
    pub pid: u32,
    pub timestamp: String,
}

/// Exclusive hold on a cache directory.
///
/// The lock file is removed by [`CacheLock::release`] or when the guard is
/// dropped, whichever happens first.
#[derive(Debug)]
pub struct CacheLock {
    dir: PathBuf,
    path: PathBuf,
    released: bool,
}

impl CacheLock {
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Removes the lock file. Calling this more than once is a no-op and
    /// removal failures are only logged.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "released cache lock"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove cache lock"
            ),
        }
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Takes the cache lock for `dir`, creating the directory if needed.
///
/// Does not wait: an existing lock file is reported as contention, and locks
/// left behind by crashed processes must be removed by hand.
///
/// # Errors
///
/// Returns `CacheError::LockContention` if the lock is already held,
/// `CacheError::CreateDir` if the directory cannot be created, and
/// `CacheError::LockIo` if the lock file cannot be written.
pub fn acquire_lock(dir: &Path) -> Result<CacheLock> {
    fs::create_dir_all(dir).map_err(|source| CacheError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(LOCK_FILE);
    let metadata = LockMetadata {
        pid: std::process::id(),
        timestamp: Utc::now().to_rfc3339(),
    };

    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let holder_pid = lock_holder(dir).map(|holder| holder.pid);
            tracing::debug!(path = %path.display(), ?holder_pid, "cache lock held by another process");
            return Err(CacheError::LockContention { path, holder_pid });
        }
        Err(source) => return Err(CacheError::LockIo { path, source }),
    };

    let lock = CacheLock {
        dir: dir.to_path_buf(),
        path,
        released: false,
    };

    // dropping the guard on error removes the partially written file
    let contents = serde_json::to_vec(&metadata).map_err(|source| CacheError::Serialize {
        path: lock.path.clone(),
        source,
    })?;
    file.write_all(&contents)
        .map_err(|source| CacheError::LockIo {
            path: lock.path.clone(),
            source,
        })?;

    tracing::debug!(path = %lock.path.display(), pid = metadata.pid, "acquired cache lock");
    Ok(lock)
}

/// Reads the current lock holder, if any.
#[must_use]
pub fn lock_holder(dir: &Path) -> Option<LockMetadata> {
    let contents = fs::read_to_string(dir.join(LOCK_FILE)).ok()?;
    serde_json::from_str(&contents).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_writes_metadata() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;

        let lock = acquire_lock(dir.path())?;

        let holder = lock_holder(dir.path()).expect("lock metadata");
        assert_eq!(holder.pid, std::process::id());
        assert!(lock.path().exists());
        Ok(())
    }

    #[test]
    fn second_acquire_is_contention() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let _lock = acquire_lock(dir.path())?;

        let result = acquire_lock(dir.path());

        match result {
            Err(CacheError::LockContention { holder_pid, .. }) => {
                assert_eq!(holder_pid, Some(std::process::id()));
            }
            other => panic!("expected contention, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn release_is_idempotent() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut lock = acquire_lock(dir.path())?;

        lock.release();
        lock.release();

        assert!(lock.is_released());
        assert!(!dir.path().join(LOCK_FILE).exists());
        Ok(())
    }

    #[test]
    fn drop_releases_lock() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let _lock = acquire_lock(dir.path())?;
        }

        let again = acquire_lock(dir.path());

        assert!(again.is_ok());
        Ok(())
    }

    #[test]
    fn stale_lock_file_is_not_expired() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(LOCK_FILE), "garbage")?;

        let result = acquire_lock(dir.path());

        assert!(matches!(
            result,
            Err(CacheError::LockContention {
                holder_pid: None,
                ..
            })
        ));
        Ok(())
    }
}
