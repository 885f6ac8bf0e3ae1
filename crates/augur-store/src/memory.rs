use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;

/// In-memory hot cache backed by moka.
///
/// Entries are evicted after TTL, so a cached read is at most `ttl` stale.
pub struct MemoryCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    pub async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_get() {
        let cache = MemoryCache::new(100, Duration::from_secs(60));
        cache.insert("BTC".to_string(), 62_000.0_f64).await;
        assert_eq!(cache.get(&"BTC".to_string()).await, Some(62_000.0));
    }

    #[tokio::test]
    async fn get_missing() {
        let cache: MemoryCache<String, f64> = MemoryCache::new(100, Duration::from_secs(60));
        assert!(cache.get(&"ETH".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = MemoryCache::new(100, Duration::from_secs(60));
        cache.insert("BTC".to_string(), 1.0_f64).await;
        cache.invalidate(&"BTC".to_string()).await;
        assert!(cache.get(&"BTC".to_string()).await.is_none());
    }
}
