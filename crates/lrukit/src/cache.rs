//! SharedLruCache: LRU cache behind a single exclusive lock

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::Mutex;

use crate::error::Result;
use crate::lru::LruCache;

/// Thread-safe handle to an [`LruCache`]
///
/// Every operation locks the whole cache for its duration: a `get` reorders
/// the recency list, so even reads need exclusive access. Cloning the handle
/// shares the same cache.
pub struct SharedLruCache<K, V, S = RandomState> {
    inner: Arc<Mutex<LruCache<K, V, S>>>,
}

impl<K, V> SharedLruCache<K, V, RandomState>
where
    K: Hash + Eq,
{
    /// Create a new shared cache with the given capacity
    ///
    /// # Returns
    /// * `Result<SharedLruCache>` - `Error::InvalidCapacity` when capacity is zero
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::from_cache(LruCache::new(capacity)?))
    }
}

impl<K, V, S> SharedLruCache<K, V, S> {
    /// Wrap an already configured cache
    pub fn from_cache(cache: LruCache<K, V, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Get current cache size
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Run `f` with the lock held, for compound operations
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut LruCache<K, V, S>) -> R) -> R {
        let mut cache = self.inner.lock();
        f(&mut cache)
    }
}

impl<K, V, S> SharedLruCache<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Insert or update a key-value pair
    pub fn set(&self, key: K, value: V) {
        self.inner.lock().set(key, value);
    }

    /// Look up a value, returning a copy
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.inner.lock().get(key)
    }

    /// Check whether a key is resident, without promotion
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().contains(key)
    }

    /// Remove a key; absent keys are ignored
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().delete(key);
    }

    /// Remove a key and return its value
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().remove(key)
    }
}

impl<K, V, S> Clone for SharedLruCache<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
