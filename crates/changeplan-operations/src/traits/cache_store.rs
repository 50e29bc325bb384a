use std::path::Path;

use changeplan_cache::ChangeCache;

use crate::Result;

/// Persistent per-commit classification cache.
///
/// A `Guard` is held for the whole load, merge and save sequence; dropping it
/// releases the lock.
pub trait ChangeCacheStore: Send + Sync {
    type Guard;

    /// # Errors
    ///
    /// Returns `CacheError::LockContention` if another writer holds the lock.
    fn lock(&self, dir: &Path) -> Result<Self::Guard>;

    /// Returns `None` for a missing or unreadable cache.
    fn load(&self, dir: &Path) -> Option<ChangeCache>;

    /// Best effort; failures are logged, never returned.
    fn save(&self, guard: &Self::Guard, cache: &ChangeCache);
}
