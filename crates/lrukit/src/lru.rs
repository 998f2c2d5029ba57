//! LRU (Least Recently Used) cache implementation
//!
//! Entries live in a slot arena and are chained into a doubly-linked list by
//! slot number, head = most recently used, tail = least recently used. The
//! index is a raw hash table of slot numbers: keys are hashed and compared
//! through the entry that owns them, so every key is stored exactly once.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::num::NonZeroUsize;

use ahash::RandomState;
use hashbrown::HashTable;
use tracing::debug;

use crate::builder::{BoxedListener, CacheBuilder, CacheConfig, ReadPolicy};
use crate::error::{Error, Result};
use crate::events::CacheEvent;
use crate::stats::CacheStats;

/// Node in the LRU doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// LRU cache with fixed capacity
///
/// ```
/// use lrukit::LruCache;
///
/// let mut cache = LruCache::new(2).unwrap();
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.get("a");      // "a" is now the most recently used
/// cache.set("c", 3);   // evicts "b"
///
/// assert_eq!(cache.get("b"), None);
/// assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec!["c", "a"]);
/// ```
pub struct LruCache<K, V, S = RandomState> {
    index: HashTable<usize>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: NonZeroUsize,
    read_policy: ReadPolicy,
    hash_builder: S,
    listener: Option<BoxedListener<K, V>>,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V, RandomState>
where
    K: Hash + Eq,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// # Errors
    /// * `Error::InvalidCapacity` - capacity is zero
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hasher(capacity, RandomState::new())
    }

    /// Create a cache from a plain configuration value
    pub fn from_config(config: CacheConfig) -> Result<Self> {
        Self::from_parts(config, RandomState::new(), None)
    }
}

impl<K, V> LruCache<K, V, RandomState> {
    /// Start building a cache with the given capacity
    pub fn builder(capacity: usize) -> CacheBuilder<K, V> {
        CacheBuilder::new(capacity)
    }
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Create a new LRU cache that hashes keys with `hash_builder`
    pub fn with_hasher(capacity: usize, hash_builder: S) -> Result<Self> {
        Self::from_parts(CacheConfig::new(capacity), hash_builder, None)
    }

    pub(crate) fn from_parts(
        config: CacheConfig,
        hash_builder: S,
        listener: Option<BoxedListener<K, V>>,
    ) -> Result<Self> {
        let capacity =
            NonZeroUsize::new(config.capacity).ok_or(Error::InvalidCapacity(config.capacity))?;

        debug!(
            capacity = capacity.get(),
            read_policy = ?config.read_policy,
            listener = listener.is_some(),
            "lru cache created"
        );

        Ok(Self {
            index: HashTable::with_capacity(capacity.get()),
            nodes: Vec::with_capacity(capacity.get()),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
            read_policy: config.read_policy,
            hash_builder,
            listener,
            stats: CacheStats::new(),
        })
    }

    /// Insert or update a key-value pair
    ///
    /// The entry becomes the most recently used. If the insert pushes the
    /// cache over capacity, the least recently used entry is evicted.
    pub fn set(&mut self, key: K, value: V) {
        let hash = self.hash_builder.hash_one(&key);

        if let Some(idx) = self.find_slot(hash, &key) {
            // Update existing
            if let Some(node) = self.nodes[idx].as_mut() {
                node.value = value;
            }
            self.move_to_front(idx);
            self.stats.record_update();
            self.notify_resident(idx, false);
            return;
        }

        let idx = self.alloc_node(Node {
            key,
            value,
            prev: None,
            next: None,
        });

        let nodes = &self.nodes;
        let hash_builder = &self.hash_builder;
        self.index
            .insert_unique(hash, idx, |&slot| slot_hash(hash_builder, nodes, slot));
        self.attach_front(idx);
        self.stats.record_insert();

        // Listeners run only once the cache is back within capacity
        let evicted = if self.index.len() > self.capacity.get() {
            self.evict()
        } else {
            None
        };

        self.notify_resident(idx, true);
        if let Some(node) = evicted {
            self.notify_detached(&node, true);
        }
    }

    /// Look up a value, returning a copy
    ///
    /// Under [`ReadPolicy::Promote`] a hit moves the entry to the head.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        let hash = self.hash_builder.hash_one(key);

        let Some(idx) = self.find_slot(hash, key) else {
            self.stats.record_miss();
            return None;
        };

        self.stats.record_hit();
        if self.read_policy == ReadPolicy::Promote {
            self.move_to_front(idx);
        }
        self.nodes[idx].as_ref().map(|node| node.value.clone())
    }

    /// Look up a value without touching the ordering or the stats
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        let idx = self.find_slot(hash, key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Check whether a key is resident, without promotion
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        self.find_slot(hash, key).is_some()
    }

    /// Remove a key; absent keys are ignored
    pub fn delete<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(key);
    }

    /// Remove a key and return its value
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        let nodes = &self.nodes;
        let entry = self
            .index
            .find_entry(hash, |&slot| slot_matches(nodes, slot, key))
            .ok()?;
        let (idx, _) = entry.remove();

        let node = self.take_node(idx)?;
        self.stats.record_removal();
        self.notify_detached(&node, false);
        Some(node.value)
    }

    /// Walk the ordering and the index and verify they agree
    ///
    /// # Errors
    /// * `Error::Inconsistent` - describes the first mismatch found
    pub fn check_invariants(&self) -> Result<()> {
        let len = self.index.len();
        if len > self.capacity.get() {
            return Err(inconsistent(format!(
                "len {} exceeds capacity {}",
                len, self.capacity
            )));
        }

        let occupied = self.nodes.iter().filter(|slot| slot.is_some()).count();
        if occupied != len {
            return Err(inconsistent(format!(
                "{} occupied slots but {} indexed keys",
                occupied, len
            )));
        }
        if occupied + self.free_list.len() != self.nodes.len() {
            return Err(inconsistent("free list does not cover vacant slots"));
        }

        let mut prev = None;
        let mut cursor = self.head;
        let mut walked = 0;
        while let Some(idx) = cursor {
            if walked == len {
                return Err(inconsistent("ordering is longer than the index (cycle?)"));
            }
            let node = self
                .nodes
                .get(idx)
                .and_then(Option::as_ref)
                .ok_or_else(|| inconsistent(format!("ordering links to vacant slot {}", idx)))?;
            if node.prev != prev {
                return Err(inconsistent(format!("slot {} has a stale back link", idx)));
            }

            let hash = self.hash_builder.hash_one(&node.key);
            if self.find_slot(hash, &node.key) != Some(idx) {
                return Err(inconsistent(format!(
                    "slot {} is not indexed under its key",
                    idx
                )));
            }

            walked += 1;
            prev = Some(idx);
            cursor = node.next;
        }

        if walked != len {
            return Err(inconsistent(format!(
                "ordering holds {} entries but index holds {}",
                walked, len
            )));
        }
        if self.tail != prev {
            return Err(inconsistent("tail does not match the last entry"));
        }
        Ok(())
    }

    fn find_slot<Q>(&self, hash: u64, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let nodes = &self.nodes;
        self.index
            .find(hash, |&slot| slot_matches(nodes, slot, key))
            .copied()
    }

    fn evict(&mut self) -> Option<Node<K, V>> {
        let tail_idx = self.tail?;
        let hash = slot_hash(&self.hash_builder, &self.nodes, tail_idx);
        if let Ok(entry) = self.index.find_entry(hash, |&slot| slot == tail_idx) {
            entry.remove();
        }

        let node = self.take_node(tail_idx)?;
        self.stats.record_eviction();
        Some(node)
    }
}

impl<K, V, S> LruCache<K, V, S> {
    /// Maximum number of resident entries
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Recency behaviour of `get`
    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    /// Hit/miss and lifecycle counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        let removed = self.index.len();
        self.index.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;

        if let Some(listener) = self.listener.as_mut() {
            listener.on_event(CacheEvent::Cleared { removed }, 0);
        }
    }

    /// Most recently used entry
    pub fn mru(&self) -> Option<(&K, &V)> {
        self.entry_at(self.head)
    }

    /// Least recently used entry, the next eviction candidate
    pub fn lru(&self) -> Option<(&K, &V)> {
        self.entry_at(self.tail)
    }

    /// Iterate over entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            next: self.head,
            remaining: self.index.len(),
        }
    }

    /// Iterate over keys from most to least recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    fn entry_at(&self, slot: Option<usize>) -> Option<(&K, &V)> {
        self.nodes
            .get(slot?)
            .and_then(Option::as_ref)
            .map(|node| (&node.key, &node.value))
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return; // Already at front
        }

        self.unlink(idx);
        self.attach_front(idx);
    }

    fn attach_front(&mut self, idx: usize) {
        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(node) = &self.nodes[idx] {
            (node.prev, node.next)
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    /// Unlink a slot that has already left the index and vacate it
    fn take_node(&mut self, idx: usize) -> Option<Node<K, V>> {
        self.unlink(idx);
        let node = self.nodes.get_mut(idx)?.take()?;
        self.free_list.push(idx);
        Some(node)
    }

    fn alloc_node(&mut self, node: Node<K, V>) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn notify_resident(&mut self, idx: usize, inserted: bool) {
        let len = self.index.len();
        let (Some(listener), Some(Some(node))) = (self.listener.as_mut(), self.nodes.get(idx))
        else {
            return;
        };

        let (key, value) = (&node.key, &node.value);
        let event = if inserted {
            CacheEvent::Inserted { key, value }
        } else {
            CacheEvent::Updated { key, value }
        };
        listener.on_event(event, len);
    }

    fn notify_detached(&mut self, node: &Node<K, V>, evicted: bool) {
        let len = self.index.len();
        let Some(listener) = self.listener.as_mut() else {
            return;
        };

        let (key, value) = (&node.key, &node.value);
        let event = if evicted {
            CacheEvent::Evicted { key, value }
        } else {
            CacheEvent::Removed { key, value }
        };
        listener.on_event(event, len);
    }
}

fn slot_matches<K, V, Q>(nodes: &[Option<Node<K, V>>], slot: usize, key: &Q) -> bool
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    nodes
        .get(slot)
        .and_then(Option::as_ref)
        .is_some_and(|node| node.key.borrow() == key)
}

fn slot_hash<K, V, S>(hash_builder: &S, nodes: &[Option<Node<K, V>>], slot: usize) -> u64
where
    K: Hash,
    S: BuildHasher,
{
    nodes
        .get(slot)
        .and_then(Option::as_ref)
        .map_or(0, |node| hash_builder.hash_one(&node.key))
}

fn inconsistent(msg: impl Into<String>) -> Error {
    Error::Inconsistent(msg.into())
}

/// Iterator over cache entries, most recently used first
pub struct Iter<'a, K, V> {
    nodes: &'a [Option<Node<K, V>>],
    next: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = nodes.get(self.next?)?.as_ref()?;
        self.next = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a LruCache<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Renders `size:N [k:v][k:v]...` from most to least recently used
impl<K, V, S> fmt::Display for LruCache<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "size:{} ", self.len())?;
        for (key, value) in self.iter() {
            write!(f, "[{}:{}]", key, value)?;
        }
        Ok(())
    }
}

impl<K, V, S> fmt::Debug for LruCache<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("read_policy", &self.read_policy)
            .field("entries", &DebugEntries(self))
            .finish_non_exhaustive()
    }
}

struct DebugEntries<'a, K, V, S>(&'a LruCache<K, V, S>);

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for DebugEntries<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}
