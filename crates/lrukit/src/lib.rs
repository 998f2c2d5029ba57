//! # lrukit
//!
//! Fixed-capacity in-memory key/value cache with least-recently-used eviction.
//!
//! ## Architecture
//! - **Index**: hashbrown raw table of slot numbers, AHash by default (O(1))
//! - **Ordering**: doubly-linked list threaded through a slot arena (O(1)
//!   promotion, removal and eviction)
//! - **Hooks**: optional event listener instead of built-in logging
//! - **Sharing**: [`SharedLruCache`] puts the whole structure behind one lock
//!
//! ```
//! use lrukit::LruCache;
//!
//! let mut cache = LruCache::new(10).unwrap();
//! cache.set("key1".to_string(), 999);
//! cache.set("key2".to_string(), 888);
//! cache.delete("key1");
//!
//! assert_eq!(cache.get("key2"), Some(888));
//! assert_eq!(cache.len(), 1);
//! ```

#![warn(missing_docs)]

mod builder;
mod cache;
mod error;
mod events;
mod lru;
mod stats;

pub use builder::{CacheBuilder, CacheConfig, ReadPolicy};
pub use cache::SharedLruCache;
pub use error::{Error, Result};
pub use events::{CacheEvent, EventListener, TracingListener};
pub use lru::{Iter, LruCache};
pub use stats::CacheStats;
