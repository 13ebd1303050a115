//! Extension trait for [`CacheBucket`] with typed convenience methods.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// Typed convenience methods for [`CacheBucket`].
///
/// Keeps [`CacheBucket`] object-safe and byte-oriented while callers store
/// ids, keys and markup directly.
///
/// # Example
///
/// ```
/// use wm_cache::{Cache, CacheBucketExt, MemoryCache};
///
/// let cache = MemoryCache::new();
/// let bucket = cache.bucket("view_ids");
///
/// bucket.set_json("website.home", "3", &42u64);
/// assert_eq!(bucket.get_json::<u64>("website.home", "3"), Some(42));
/// assert_eq!(bucket.get_json::<u64>("website.home", "4"), None);
/// ```
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a JSON-deserialized value.
    ///
    /// Returns `None` on cache miss, etag mismatch, or deserialization failure.
    fn get_json<T: DeserializeOwned>(&self, key: &str, etag: &str) -> Option<T> {
        let bytes = self.get(key, etag)?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Store a value as JSON. Does nothing if serialization fails.
    fn set_json<T: Serialize>(&self, key: &str, etag: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set(key, etag, &bytes),
            Err(e) => tracing::warn!(error = %e, key, "Failed to serialize cache entry"),
        }
    }

    /// Retrieve a cached UTF-8 string.
    fn get_string(&self, key: &str, etag: &str) -> Option<String> {
        let bytes = self.get(key, etag)?;
        String::from_utf8(bytes).ok()
    }

    fn set_string(&self, key: &str, etag: &str, value: &str) {
        self.set(key, etag, value.as_bytes());
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::{Cache, MemoryCache, NullCache};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: u64,
        key: String,
    }

    #[test]
    fn test_json_round_trip_with_etag() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("templates");
        let entry = Entry {
            id: 7,
            key: "website.home".to_owned(),
        };

        bucket.set_json("k", "1", &entry);

        assert_eq!(bucket.get_json::<Entry>("k", "1"), Some(entry));
        assert_eq!(bucket.get_json::<Entry>("k", "2"), None);
    }

    #[test]
    fn test_get_json_wrong_shape_misses() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("templates");
        bucket.set_string("k", "1", "not json");

        assert_eq!(bucket.get_json::<Entry>("k", "1"), None);
        assert_eq!(bucket.get_string("k", "1").as_deref(), Some("not json"));
    }

    #[test]
    fn test_null_cache_ext_misses() {
        let bucket = NullCache.bucket("templates");
        bucket.set_string("k", "1", "value");
        assert_eq!(bucket.get_string("k", "1"), None);
    }
}
