//! TTL response cache.

use dashmap::DashMap;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;

/// A cached JSON payload.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Valid only while `now - stored_at < ttl`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) < self.ttl
    }
}

/// Thread-safe cache of parsed JSON responses.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh payload for `key`. A stale entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let fresh = self
            .entries
            .get(key)
            .map(|entry| entry.is_fresh(now).then(|| entry.data.clone()));

        match fresh {
            Some(Some(data)) => {
                metrics::record_cache_lookup(true);
                Some(data)
            }
            Some(None) => {
                self.entries.remove_if(key, |_, entry| !entry.is_fresh(now));
                metrics::record_cache_lookup(false);
                None
            }
            None => {
                metrics::record_cache_lookup(false);
                None
            }
        }
    }

    /// Store `data` under `key`, replacing any previous entry.
    pub fn insert(&self, key: impl Into<String>, data: Value, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.remove(key).map(|(_, entry)| entry.data)
    }

    /// Remove every expired entry. Returns how many were evicted.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            metrics::record_cache_evictions(evicted);
        }
        evicted
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_read_within_ttl_returns_data() {
        let cache = ResponseCache::new();
        cache.insert("k", json!({"deals": [1, 2]}), Duration::from_millis(500));

        tokio::time::advance(Duration::from_millis(499)).await;
        assert_eq!(cache.get("k"), Some(json!({"deals": [1, 2]})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_at_ttl_is_a_miss() {
        let cache = ResponseCache::new();
        cache.insert("k", json!(1), Duration::from_millis(500));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "stale entry should be dropped on read");
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_overwrites_and_restarts_ttl() {
        let cache = ResponseCache::new();
        cache.insert("k", json!("old"), Duration::from_millis(100));
        tokio::time::advance(Duration::from_millis(80)).await;

        cache.insert("k", json!("new"), Duration::from_millis(100));
        tokio::time::advance(Duration::from_millis(80)).await;

        assert_eq!(cache.get("k"), Some(json!("new")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let cache = ResponseCache::new();
        cache.insert("short", json!(1), Duration::from_secs(1));
        cache.insert("long", json!(2), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long"), Some(json!(2)));
    }
}
