#![no_main]

use libfuzzer_sys::fuzz_target;
use lrukit::LruCache;

// Fuzz arbitrary operation sequences on a small cache
//
// Two bytes per operation: op selector and key. A tiny key space and
// capacity keep evictions, promotions and deletes colliding constantly.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let capacity = usize::from(data[0] % 8) + 1;
    let mut cache: LruCache<u8, u32> = LruCache::new(capacity).unwrap();

    let mut idx = 1;
    while idx + 1 < data.len() {
        let op = data[idx] % 5;
        let key = data[idx + 1] % 16;

        match op {
            0 => {
                cache.set(key, u32::from(data[idx]));
                assert_eq!(cache.mru().map(|(k, _)| *k), Some(key));
            }
            1 => {
                let hit = cache.get(&key).is_some();
                if hit {
                    assert_eq!(cache.mru().map(|(k, _)| *k), Some(key));
                }
            }
            2 => {
                cache.delete(&key);
                assert!(!cache.contains(&key));
            }
            3 => {
                let before = cache.len();
                let peeked = cache.peek(&key).is_some();
                assert_eq!(peeked, cache.contains(&key));
                assert_eq!(before, cache.len());
            }
            4 => {
                if data[idx + 1] == 0xff {
                    cache.clear();
                    assert!(cache.is_empty());
                }
            }
            _ => unreachable!(),
        }

        assert!(cache.len() <= capacity);
        assert_eq!(cache.iter().count(), cache.len());
        assert!(cache.check_invariants().is_ok());

        idx += 2;
    }
});
