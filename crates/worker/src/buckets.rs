//! Named cache buckets, keyed by request URL.
//!
//! Mirrors the browser surface the layer runs against: open-by-name,
//! match-by-request, put, delete-bucket, list-bucket-names. Buckets live in
//! one [`CacheStorage`] that outlives any single worker generation.

use std::collections::HashMap;

use crate::request::CachedResponse;

/// One named cache of URL → response pairs.
#[derive(Debug, Default)]
pub struct CacheBucket {
    entries: HashMap<String, CachedResponse>,
}

impl CacheBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a response, replacing any previous entry for the URL.
    pub fn put(&mut self, url: impl Into<String>, response: CachedResponse) {
        self.entries.insert(url.into(), response);
    }

    pub fn match_url(&self, url: &str) -> Option<&CachedResponse> {
        self.entries.get(url)
    }

    pub fn delete(&mut self, url: &str) -> bool {
        self.entries.remove(url).is_some()
    }

    pub fn urls(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All cache buckets for the origin.
#[derive(Debug, Default)]
pub struct CacheStorage {
    buckets: HashMap<String, CacheBucket>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a bucket, creating it if absent.
    pub fn open(&mut self, name: &str) -> &mut CacheBucket {
        self.buckets.entry(name.to_string()).or_default()
    }

    /// Delete a bucket wholesale.
    pub fn delete(&mut self, name: &str) -> bool {
        self.buckets.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    /// Match a URL in a specific bucket.
    pub fn match_in(&self, bucket: &str, url: &str) -> Option<&CachedResponse> {
        self.buckets.get(bucket).and_then(|b| b.match_url(url))
    }

    /// Match a URL across every bucket.
    pub fn match_any(&self, url: &str) -> Option<&CachedResponse> {
        self.buckets.values().find_map(|b| b.match_url(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_and_reuses() {
        let mut storage = CacheStorage::new();
        storage.open("static-v1").put("/app.js", CachedResponse::ok(b"js".to_vec()));
        storage.open("static-v1").put("/app.css", CachedResponse::ok(b"css".to_vec()));

        assert_eq!(storage.open("static-v1").len(), 2);
        assert_eq!(storage.names(), vec!["static-v1".to_string()]);
    }

    #[test]
    fn match_any_searches_all_buckets() {
        let mut storage = CacheStorage::new();
        storage.open("static-v1").put("/app.js", CachedResponse::ok(b"js".to_vec()));
        storage.open("api-v1").put("/rest/v1/me", CachedResponse::ok(b"{}".to_vec()));

        assert!(storage.match_any("/app.js").is_some());
        assert!(storage.match_any("/rest/v1/me").is_some());
        assert!(storage.match_any("/missing").is_none());
    }

    #[test]
    fn delete_removes_the_whole_bucket() {
        let mut storage = CacheStorage::new();
        storage.open("static-v1").put("/app.js", CachedResponse::ok(Vec::new()));

        assert!(storage.delete("static-v1"));
        assert!(!storage.delete("static-v1"));
        assert!(storage.match_any("/app.js").is_none());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let mut bucket = CacheBucket::new();
        bucket.put("/a", CachedResponse::ok(b"old".to_vec()));
        bucket.put("/a", CachedResponse::ok(b"new".to_vec()));

        assert_eq!(bucket.match_url("/a").unwrap().body, b"new");
        assert_eq!(bucket.len(), 1);
    }
}
