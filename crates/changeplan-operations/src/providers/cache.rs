use std::path::Path;

use changeplan_cache::{CacheLock, ChangeCache, acquire_lock, load, save};

use crate::Result;
use crate::traits::ChangeCacheStore;

pub struct FileSystemCacheStore;

impl FileSystemCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeCacheStore for FileSystemCacheStore {
    type Guard = CacheLock;

    fn lock(&self, dir: &Path) -> Result<CacheLock> {
        Ok(acquire_lock(dir)?)
    }

    fn load(&self, dir: &Path) -> Option<ChangeCache> {
        load(dir)
    }

    fn save(&self, guard: &CacheLock, cache: &ChangeCache) {
        save(guard, cache);
    }
}
