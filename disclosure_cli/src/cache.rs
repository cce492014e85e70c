//! Short-lived response cache for the HTTP surface, backed by `DashMap`.

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct CachedResponse {
    body: String,
    expires_at: Instant,
}

/// Rendered JSON bodies keyed by request path and query.
///
/// Expired entries are evicted on lookup of the same key and swept on every
/// insert, so the map never outgrows the set of live keys plus one.
pub struct ResponseCache {
    store: DashMap<String, CachedResponse>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// `None` when `ttl_secs` is 0, which disables caching.
    pub fn from_ttl_secs(ttl_secs: u64) -> Option<Self> {
        (ttl_secs > 0).then(|| Self::new(Duration::from_secs(ttl_secs)))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.store.get(key)?;
        if Instant::now() > entry.expires_at {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.body.clone())
    }

    pub fn insert(&self, key: String, body: String) {
        let now = Instant::now();
        self.store.retain(|_, entry| entry.expires_at > now);
        self.store.insert(
            key,
            CachedResponse {
                body,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }
}
