//! Lifecycle events and observer hooks
//!
//! A cache never logs on its own. Callers that want to watch entries being
//! created, overwritten, evicted or removed inject an [`EventListener`]
//! through the builder.

use std::fmt;

use tracing::{debug, trace};

/// Something that happened to the cache contents
///
/// Borrowed data points into the entry the event concerns. For `Evicted`
/// and `Removed` the entry has already left both the index and the
/// ordering when the listener runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent<'a, K, V> {
    /// A new entry was created at the head
    Inserted {
        /// Key of the new entry
        key: &'a K,
        /// Value stored
        value: &'a V,
    },

    /// An existing entry was overwritten and promoted
    Updated {
        /// Key of the entry
        key: &'a K,
        /// New value
        value: &'a V,
    },

    /// The tail entry was dropped to stay within capacity
    Evicted {
        /// Key of the evicted entry
        key: &'a K,
        /// Value it held
        value: &'a V,
    },

    /// An entry was removed by `delete`/`remove`
    Removed {
        /// Key of the removed entry
        key: &'a K,
        /// Value it held
        value: &'a V,
    },

    /// Every entry was dropped by `clear`
    Cleared {
        /// Number of entries that were resident
        removed: usize,
    },
}

/// Observer for cache lifecycle events
///
/// `len` is the number of resident entries after the operation that
/// produced the event.
pub trait EventListener<K, V> {
    /// Called once per event, synchronously, inside the cache operation
    fn on_event(&mut self, event: CacheEvent<'_, K, V>, len: usize);
}

impl<K, V, F> EventListener<K, V> for F
where
    F: FnMut(CacheEvent<'_, K, V>, usize),
{
    fn on_event(&mut self, event: CacheEvent<'_, K, V>, len: usize) {
        self(event, len)
    }
}

/// Listener that forwards every event to `tracing`
///
/// Creates, updates and clears are logged at DEBUG, evictions and removals
/// at TRACE.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl<K, V> EventListener<K, V> for TracingListener
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn on_event(&mut self, event: CacheEvent<'_, K, V>, len: usize) {
        match event {
            CacheEvent::Inserted { key, value } => debug!(len, ?key, ?value, "new"),
            CacheEvent::Updated { key, value } => debug!(len, ?key, ?value, "update"),
            CacheEvent::Evicted { key, value } => trace!(len, ?key, ?value, "evicted"),
            CacheEvent::Removed { key, value } => trace!(len, ?key, ?value, "deleted"),
            CacheEvent::Cleared { removed } => debug!(len, removed, "clear"),
        }
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for CacheEvent<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEvent::Inserted { key, value } => write!(f, "[new] {}:{}", key, value),
            CacheEvent::Updated { key, value } => write!(f, "[update] {}:{}", key, value),
            CacheEvent::Evicted { key, value } => write!(f, "[evicted] {}:{}", key, value),
            CacheEvent::Removed { key, value } => write!(f, "[deleted] {}:{}", key, value),
            CacheEvent::Cleared { removed } => write!(f, "[clear] {} entries", removed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing::Level;

    #[test]
    fn test_event_display() {
        let key = "key1";
        let value = 999;

        let event = CacheEvent::Inserted { key: &key, value: &value };
        assert_eq!(event.to_string(), "[new] key1:999");

        let event = CacheEvent::Removed { key: &key, value: &value };
        assert_eq!(event.to_string(), "[deleted] key1:999");

        let event: CacheEvent<'_, &str, i32> = CacheEvent::Cleared { removed: 3 };
        assert_eq!(event.to_string(), "[clear] 3 entries");
    }

    #[test]
    fn test_closure_listener() {
        let mut seen = Vec::new();
        {
            let mut listener = |event: CacheEvent<'_, u32, u32>, len: usize| {
                seen.push((event.to_string(), len));
            };
            listener.on_event(CacheEvent::Updated { key: &1, value: &2 }, 1);
        }
        assert_eq!(seen, vec![("[update] 1:2".to_string(), 1)]);
    }

    /// Collects formatted tracing output in memory
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_listener_logs_events() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut listener = TracingListener;
            listener.on_event(CacheEvent::Inserted { key: &1u32, value: &10u32 }, 1);
            listener.on_event(CacheEvent::Evicted { key: &2u32, value: &20u32 }, 1);
            EventListener::<u32, u32>::on_event(
                &mut listener,
                CacheEvent::Cleared { removed: 1 },
                0,
            );
        });

        let output = String::from_utf8(capture.0.lock().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3, "{}", output);
        assert!(lines[0].contains("DEBUG"));
        assert!(lines[0].contains("new"));
        assert!(lines[0].contains("key=1 value=10"));
        assert!(lines[1].contains("TRACE"));
        assert!(lines[1].contains("evicted"));
        assert!(lines[1].contains("key=2 value=20"));
        assert!(lines[2].contains("clear"));
        assert!(lines[2].contains("removed=1"));
    }
}
