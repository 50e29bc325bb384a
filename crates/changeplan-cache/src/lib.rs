//! On-disk cache of classified commits.
//!
//! Layout of a cache directory:
//!
//! - `cache.json`: the serialized [`ChangeCache`]
//! - `graph.json`: `{hash, timestamp}` of the workspace graph the cache was built for
//! - `.cache.lock`: advisory lock marker, see [`acquire_lock`]

mod cache;
mod error;
mod lock;
mod store;

pub use cache::{CacheMeta, ChangeCache, Invalidation, LastTag};
pub use error::CacheError;
pub use lock::{CacheLock, LOCK_FILE, LockMetadata, acquire_lock, lock_holder};
pub use store::{CACHE_FILE, GRAPH_FILE, GraphSnapshot, is_valid, load, save};

pub type Result<T> = std::result::Result<T, CacheError>;
