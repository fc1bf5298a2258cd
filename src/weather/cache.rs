//! Bounded read-through cache for normalized forecast results.
//!
//! Keyed by (hour-bucketed timestamp, region). Entries are write-once:
//! a new clock hour produces a new key, so nothing is ever invalidated
//! explicitly. The LRU bound only stops the map growing without limit
//! across regions and hours. A racing duplicate fetch under concurrent
//! handlers is harmless — recomputing an entry is idempotent.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    /// `YYYYMMDDHH`
    pub hour: String,
    pub region: String,
}

impl CacheKey {
    pub fn new(hour: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            hour: hour.into(),
            region: region.into(),
        }
    }
}

/// One cache instance per fetch operation, shared across handlers.
#[derive(Debug)]
pub struct ForecastCache<T: Clone> {
    inner: Mutex<LruCache<CacheKey, T>>,
}

impl<T: Clone> ForecastCache<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<T> {
        self.inner.lock().expect("cache lock poisoned").get(key).cloned()
    }

    pub fn put(&self, key: CacheKey, value: T) {
        self.inner.lock().expect("cache lock poisoned").put(key, value);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for ForecastCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
