// ==============================================
// END-TO-END CACHE SCENARIOS (integration)
// ==============================================
//
// Operation sequences driven purely through the public API, checking
// contents, recency order and structural consistency after each step.

use lrukit::{CacheEvent, LruCache, SharedLruCache};

const VALUES: [i32; 6] = [999, 888, 777, 666, 555, 444];

fn seeded(capacity: usize) -> LruCache<String, i32> {
    let mut cache = LruCache::new(capacity).unwrap();
    for (i, value) in VALUES.iter().enumerate() {
        cache.set(format!("key{}", i + 1), *value);
    }
    cache
}

fn order(cache: &LruCache<String, i32>) -> Vec<&str> {
    cache.keys().map(String::as_str).collect()
}

// ==============================================
// Capacity 10: insert, delete, overwrite
// ==============================================

#[test]
fn insert_six_keys_orders_newest_first() {
    let cache = seeded(10);

    assert_eq!(cache.len(), 6);
    assert_eq!(
        order(&cache),
        vec!["key6", "key5", "key4", "key3", "key2", "key1"]
    );
    assert_eq!(
        cache.to_string(),
        "size:6 [key6:444][key5:555][key4:666][key3:777][key2:888][key1:999]"
    );
    cache.check_invariants().unwrap();
}

#[test]
fn delete_then_overwrite_promotes() {
    let mut cache = seeded(10);

    cache.delete("key2");
    assert_eq!(cache.len(), 5);
    assert!(!cache.contains("key2"));

    cache.set("key5".to_string(), 1000);
    assert_eq!(cache.len(), 5);
    assert_eq!(cache.mru(), Some((&"key5".to_string(), &1000)));
    assert_eq!(cache.get("key5"), Some(1000));
    assert_eq!(order(&cache), vec!["key5", "key6", "key4", "key3", "key1"]);
    cache.check_invariants().unwrap();
}

// ==============================================
// Capacity 10: eviction in insertion order
// ==============================================

#[test]
fn overflow_evicts_oldest_inserted() {
    let mut cache = seeded(10);

    for i in 7..=11 {
        cache.set(format!("key{}", i), i);
    }

    assert_eq!(cache.len(), 10);
    assert_eq!(cache.get("key1"), None);
    for i in 2..=11 {
        assert!(cache.contains(format!("key{}", i).as_str()), "key{} missing", i);
    }
    assert_eq!(cache.lru().map(|(k, _)| k.as_str()), Some("key2"));
    assert_eq!(cache.stats().evictions(), 1);
    cache.check_invariants().unwrap();
}

#[test]
fn read_protects_from_eviction() {
    let mut cache = seeded(6);

    assert_eq!(cache.get("key1"), Some(999));
    cache.set("key7".to_string(), 7);

    assert!(cache.contains("key1"));
    assert!(!cache.contains("key2"));
}

#[test]
fn evictions_are_reported_in_order() {
    let (tx, rx) = std::sync::mpsc::channel();

    let mut cache = LruCache::<u32, u32>::builder(3)
        .on_event(move |event, _len| {
            if let CacheEvent::Evicted { key, .. } = event {
                let _ = tx.send(*key);
            }
        })
        .build()
        .unwrap();

    for key in 0..8 {
        cache.set(key, key);
    }
    drop(cache);
    let evicted: Vec<u32> = rx.iter().collect();

    assert_eq!(evicted, vec![0, 1, 2, 3, 4]);
}

// ==============================================
// Clear
// ==============================================

#[test]
fn clear_forgets_everything() {
    let mut cache = seeded(10);

    cache.clear();

    assert_eq!(cache.len(), 0);
    for i in 1..=6 {
        assert_eq!(cache.get(format!("key{}", i).as_str()), None);
    }
    cache.check_invariants().unwrap();

    cache.set("fresh".to_string(), 1);
    assert_eq!(order(&cache), vec!["fresh"]);
}

// ==============================================
// Shared handle
// ==============================================

#[test]
fn shared_handle_sees_same_cache() {
    let cache = SharedLruCache::new(2).unwrap();
    let other = cache.clone();

    cache.set("a", 1);
    other.set("b", 2);
    other.set("c", 3);

    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("c"), Some(3));
    assert_eq!(other.len(), 2);
}
