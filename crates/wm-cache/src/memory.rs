//! Process-local cache implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::{Cache, CacheBucket};

type Entries = Arc<RwLock<HashMap<String, Entry>>>;

struct Entry {
    etag: String,
    value: Vec<u8>,
}

/// In-memory [`Cache`]. Buckets with the same name share entries.
///
/// # Panics
///
/// Bucket operations panic if an internal lock is poisoned.
#[derive(Default)]
pub struct MemoryCache {
    buckets: Mutex<HashMap<String, Entries>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        let mut buckets = self.buckets.lock().unwrap();
        let entries = buckets.entry(name.to_owned()).or_default();
        Box::new(MemoryCacheBucket {
            entries: Arc::clone(entries),
        })
    }
}

struct MemoryCacheBucket {
    entries: Entries,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read().unwrap();
        let entry = entries.get(key)?;
        if !etag.is_empty() && entry.etag != etag {
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        self.entries.write().unwrap().insert(
            key.to_owned(),
            Entry {
                etag: etag.to_owned(),
                value: value.to_vec(),
            },
        );
    }

    fn clear(&self) {
        let mut entries = self.entries.write().unwrap();
        tracing::debug!(entries = entries.len(), "Clearing cache bucket");
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_after_set() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("templates");

        bucket.set("home", "1", b"<div/>");

        assert_eq!(bucket.get("home", "1"), Some(b"<div/>".to_vec()));
    }

    #[test]
    fn test_etag_mismatch_misses() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("templates");

        bucket.set("home", "1", b"<div/>");

        assert_eq!(bucket.get("home", "2"), None);
    }

    #[test]
    fn test_empty_etag_skips_validation() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("templates");

        bucket.set("home", "1", b"<div/>");

        assert_eq!(bucket.get("home", ""), Some(b"<div/>".to_vec()));
    }

    #[test]
    fn test_set_overwrites_previous_etag() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("templates");

        bucket.set("home", "1", b"old");
        bucket.set("home", "2", b"new");

        assert_eq!(bucket.get("home", "1"), None);
        assert_eq!(bucket.get("home", "2"), Some(b"new".to_vec()));
    }

    #[test]
    fn test_same_name_shares_entries() {
        let cache = MemoryCache::new();
        cache.bucket("templates").set("home", "1", b"x");

        assert_eq!(cache.bucket("templates").get("home", "1"), Some(b"x".to_vec()));
        assert_eq!(cache.bucket("view_ids").get("home", "1"), None);
    }

    #[test]
    fn test_clear() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("templates");
        bucket.set("a", "1", b"x");
        bucket.set("b", "1", b"y");

        cache.bucket("templates").clear();

        assert_eq!(bucket.get("a", "1"), None);
        assert_eq!(bucket.get("b", ""), None);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = MemoryCache::new();

        std::thread::scope(|s| {
            for t in 0..4 {
                let cache = &cache;
                s.spawn(move || {
                    let bucket = cache.bucket("templates");
                    for i in 0..100 {
                        let key = format!("{t}-{i}");
                        bucket.set(&key, "1", key.as_bytes());
                        assert_eq!(bucket.get(&key, "1"), Some(key.clone().into_bytes()));
                    }
                });
            }
        });
    }

    #[test]
    fn test_memory_cache_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemoryCache>();
    }
}
