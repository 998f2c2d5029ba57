#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use lrukit::SharedLruCache;

// One operation per input against a long-lived cache
//
// Input layout: op byte, i32 big-endian value, key bytes. Op 1 set,
// 2 get, 3 delete, 4 clear; anything else is rejected.
static CACHE: OnceLock<SharedLruCache<String, i32>> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }

    let shared = CACHE.get_or_init(|| SharedLruCache::new(1000).unwrap());

    let key = String::from_utf8_lossy(&data[5..]).into_owned();
    let value = i32::from_be_bytes([data[1], data[2], data[3], data[4]]);

    shared.with_lock(|cache| {
        match data[0] {
            1 => {
                cache.set(key.clone(), value);
                assert_eq!(cache.mru(), Some((&key, &value)));
            }
            2 => {
                let _ = cache.get(key.as_str());
            }
            3 => {
                cache.delete(key.as_str());
                assert!(!cache.contains(key.as_str()));
            }
            4 => {
                cache.clear();
                assert!(cache.is_empty());
            }
            _ => return,
        }

        assert!(cache.len() <= cache.capacity());
        assert!(cache.check_invariants().is_ok());
    });
});
