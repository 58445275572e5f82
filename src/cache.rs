use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

/// Bounded LRU map from request key to response, shared across workers.
///
/// A capacity of zero disables the cache: `get` always misses and `put`
/// is a no-op.
pub struct ResponseCache<V> {
    inner: Option<Mutex<LruCache<String, V>>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(capacity: usize) -> Self {
        ResponseCache {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.as_ref()?.lock().get(key).cloned()
    }

    pub fn put(&self, key: String, value: V) {
        if let Some(cache) = &self.inner {
            cache.lock().put(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |cache| cache.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Key for `request` as solved by `solver`; `None` if it cannot be serialized.
pub fn cache_key<T: Serialize>(solver: &str, request: &T) -> Option<String> {
    serde_json::to_string(request)
        .ok()
        .map(|body| format!("{}:{}", solver, body))
}
