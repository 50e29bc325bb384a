use std::fs;
use std::io;
use std::path::Path;

use changeplan_core::{GitRange, RevisionGraph};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;
use crate::cache::{ChangeCache, Invalidation};
use crate::error::CacheError;
use crate::lock::CacheLock;

pub const CACHE_FILE: &str = "cache.json";
pub const GRAPH_FILE: &str = "graph.json";

/// Snapshot of the workspace graph hash written next to the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub hash: String,
    pub timestamp: String,
}

fn read_cache(dir: &Path) -> Result<ChangeCache> {
    let path = dir.join(CACHE_FILE);
    let contents = fs::read_to_string(&path).map_err(|source| CacheError::Read {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CacheError::Parse { path, source })
}

/// Loads the cache in `dir`.
///
/// A missing, unreadable or corrupt cache is reported as `None`; corruption
/// is logged and never surfaces as an error.
#[must_use]
pub fn load(dir: &Path) -> Option<ChangeCache> {
    match read_cache(dir) {
        Ok(cache) => {
            debug!(dir = %dir.display(), commits = cache.len(), "loaded change cache");
            Some(cache)
        }
        Err(CacheError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "no change cache present");
            None
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "ignoring unreadable change cache");
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value).map_err(|source| CacheError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, contents).map_err(|source| CacheError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn try_save(dir: &Path, cache: &ChangeCache) -> Result<()> {
    write_json(&dir.join(CACHE_FILE), cache)?;
    write_json(
        &dir.join(GRAPH_FILE),
        &GraphSnapshot {
            hash: cache.meta.graph_hash.clone(),
            timestamp: Utc::now().to_rfc3339(),
        },
    )
}

/// Writes `cache.json` and `graph.json` into the locked directory.
///
/// Failures are logged and swallowed; a missing cache only costs a rebuild.
pub fn save(lock: &CacheLock, cache: &ChangeCache) {
    let dir = lock.dir();
    match try_save(dir, cache) {
        Ok(()) => debug!(dir = %dir.display(), commits = cache.len(), "saved change cache"),
        Err(e) => warn!(dir = %dir.display(), error = %e, "failed to save change cache"),
    }
}

/// Whether the cache in `dir` can serve `range`.
///
/// See [`ChangeCache::check`] for the rules applied to `graph_hash` and `head`.
#[must_use]
pub fn is_valid(
    dir: &Path,
    range: &GitRange,
    graph_hash: Option<&str>,
    head: Option<&str>,
    revisions: &dyn RevisionGraph,
) -> bool {
    let result = load(dir).map_or(Err(Invalidation::Missing), |cache| {
        cache.check(range, graph_hash, head, revisions)
    });

    match result {
        Ok(()) => true,
        Err(reason) => {
            debug!(dir = %dir.display(), %range, %reason, "change cache invalid");
            false
        }
    }
}
