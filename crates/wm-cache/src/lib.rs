//! Cache abstraction layer for resolved views.
//!
//! Two traits form the core API:
//!
//! - [`Cache`]: Factory for named cache buckets
//! - [`CacheBucket`]: Key-value store with etag-based invalidation
//!
//! Callers pass the store generation as the etag, so an entry written before
//! a commit never validates against a snapshot taken after it.
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: No-op implementations (always miss)
//! - [`MemoryCache`]: Process-local implementation shared across threads
//!
//! # Example
//!
//! ```
//! use wm_cache::{Cache, NullCache};
//!
//! let cache = NullCache;
//! let bucket = cache.bucket("templates");
//! bucket.set("website.home", "1", b"<div/>");
//! assert_eq!(bucket.get("website.home", "1"), None); // NullCache always misses
//! ```

mod ext;
mod memory;

pub use ext::CacheBucketExt;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// Each bucket stores key-value pairs where values are invalidated by an etag.
/// The etag is an opaque string chosen by the caller. A cache hit occurs only
/// when both the key and etag match.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `Some(value)` if the key exists **and** was stored with the same
    /// `etag`. Returns `None` on cache miss or etag mismatch.
    ///
    /// If `etag` is an empty string, etag validation is skipped and the cached
    /// data is returned regardless of the stored etag.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store a value in the cache.
    ///
    /// Overwrites any existing entry for the same key, regardless of the
    /// previous etag.
    fn set(&self, key: &str, etag: &str, value: &[u8]);

    /// Drop every entry of the bucket.
    fn clear(&self);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// Calling `bucket` multiple times with the same name returns handles that
/// share the same underlying storage.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket (e.g., "`view_ids`", "templates").
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}

    fn clear(&self) {}
}

/// No-op [`Cache`] that always returns [`NullCacheBucket`]s.
///
/// Use when caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let cache = NullCache;
        let bucket = cache.bucket("templates");

        assert_eq!(bucket.get("key", "1"), None);

        bucket.set("key", "1", b"hello");
        assert_eq!(bucket.get("key", "1"), None);
        assert_eq!(bucket.get("key", ""), None);
    }
}
