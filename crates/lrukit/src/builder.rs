//! Cache configuration and builder

use std::hash::{BuildHasher, Hash};

use ahash::RandomState;

use crate::error::Result;
use crate::events::{CacheEvent, EventListener};
use crate::lru::LruCache;

/// Whether a successful `get` counts as a use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Reads promote the entry to the head (classic LRU)
    #[default]
    Promote,

    /// Reads leave the ordering untouched; only `set` promotes
    Peek,
}

/// Plain cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of resident entries, must be positive
    pub capacity: usize,

    /// Recency behaviour of `get`
    pub read_policy: ReadPolicy,
}

impl CacheConfig {
    /// Configuration with the given capacity and default read policy
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            read_policy: ReadPolicy::default(),
        }
    }
}

pub(crate) type BoxedListener<K, V> = Box<dyn EventListener<K, V> + Send>;

/// Builder for [`LruCache`]
///
/// ```
/// use lrukit::{LruCache, ReadPolicy};
///
/// let mut cache = LruCache::builder(2)
///     .read_policy(ReadPolicy::Peek)
///     .build()
///     .unwrap();
///
/// cache.set("a", 1);
/// cache.set("b", 2);
/// assert_eq!(cache.get("a"), Some(1));
///
/// // "a" was only read, so it is still the eviction candidate
/// cache.set("c", 3);
/// assert_eq!(cache.get("a"), None);
/// ```
pub struct CacheBuilder<K, V, S = RandomState> {
    config: CacheConfig,
    hash_builder: S,
    listener: Option<BoxedListener<K, V>>,
}

impl<K, V> CacheBuilder<K, V, RandomState> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self::from_config(CacheConfig::new(capacity))
    }

    pub(crate) fn from_config(config: CacheConfig) -> Self {
        Self {
            config,
            hash_builder: RandomState::new(),
            listener: None,
        }
    }
}

impl<K, V, S> CacheBuilder<K, V, S> {
    /// Set the read policy
    pub fn read_policy(mut self, policy: ReadPolicy) -> Self {
        self.config.read_policy = policy;
        self
    }

    /// Install an event listener, replacing any previous one
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<K, V> + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Install a closure as the event listener
    pub fn on_event<F>(self, f: F) -> Self
    where
        F: FnMut(CacheEvent<'_, K, V>, usize) + Send + 'static,
    {
        self.listener(f)
    }

    /// Use a custom hasher for the index
    pub fn hasher<S2>(self, hash_builder: S2) -> CacheBuilder<K, V, S2> {
        CacheBuilder {
            config: self.config,
            hash_builder,
            listener: self.listener,
        }
    }
}

impl<K, V, S> CacheBuilder<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Build the cache
    ///
    /// # Errors
    /// * `Error::InvalidCapacity` - capacity is zero
    pub fn build(self) -> Result<LruCache<K, V, S>> {
        LruCache::from_parts(self.config, self.hash_builder, self.listener)
    }
}
