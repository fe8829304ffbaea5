//! In-memory response store with time-based expiry.

use super::key::CacheKey;
use crate::types::QueryResponse;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone)]
struct CacheEntry {
    response: QueryResponse,
    created_at: Instant,
}

impl CacheEntry {
    fn new(response: QueryResponse) -> Self {
        Self {
            response,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Live (unexpired) entries.
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Fingerprint → response map shared by every in-flight query.
///
/// Bounded: once `max_entries` live entries exist, the least recently read
/// one is evicted. Locks are never held across an `.await`.
pub struct ResponseCache {
    entries: RwLock<LruCache<String, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(cap)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn read(&self) -> RwLockReadGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a live entry. Expired entries are evicted and reported as a miss.
    ///
    /// The returned copy is marked `cached`; the stored response is not.
    pub fn get(&self, key: &CacheKey) -> Option<QueryResponse> {
        let mut entries = self.write();
        let expired = match entries.peek(key.as_str()) {
            None => false,
            Some(entry) => entry.is_expired(self.ttl),
        };
        if expired {
            entries.pop(key.as_str());
        }
        match entries.get(key.as_str()) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                let mut response = entry.response.clone();
                response.cached = true;
                Some(response)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set(&self, key: &CacheKey, response: &QueryResponse) {
        let mut stored = response.clone();
        stored.cached = false;
        let mut entries = self.write();
        // Reclaim stale slots before the LRU would evict a live entry.
        if entries.len() >= entries.cap().get() && !entries.contains(key.as_str()) {
            Self::purge_expired(&mut entries, self.ttl);
        }
        entries.put(key.hash.clone(), CacheEntry::new(stored));
    }

    fn purge_expired(entries: &mut LruCache<String, CacheEntry>, ttl: Duration) -> usize {
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.is_expired(ttl))
            .map(|(k, _)| k.clone())
            .collect();
        for k in &stale {
            entries.pop(k.as_str());
        }
        stale.len()
    }

    /// Drop every entry older than the TTL. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        Self::purge_expired(&mut self.write(), self.ttl)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        let ttl = self.ttl;
        self.read().iter().filter(|(_, e)| !e.is_expired(ttl)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Run [`ResponseCache::cleanup`] every `every` on a background task.
///
/// The task only holds a weak reference and stops on its own once the cache
/// is dropped; callers abort the handle to stop it sooner.
pub fn spawn_cleanup(cache: &Arc<ResponseCache>, every: Duration) -> JoinHandle<()> {
    let weak: Weak<ResponseCache> = Arc::downgrade(cache);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        loop {
            ticker.tick().await;
            let Some(cache) = weak.upgrade() else {
                break;
            };
            let removed = cache.cleanup();
            if removed > 0 {
                debug!(removed, remaining = cache.len(), "cache cleanup");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Backend;

    fn response(content: &str) -> QueryResponse {
        QueryResponse {
            content: content.to_string(),
            provider: Backend::OpenAi,
            model: "gpt-4o-mini".to_string(),
            latency_ms: 42,
            citations: None,
            cached: false,
            tier: 2,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_is_copy_on_read() {
        let cache = ResponseCache::new(Duration::from_secs(300), 10);
        let key = CacheKey::from("k");
        cache.set(&key, &response("4"));

        let hit = cache.get(&key).unwrap();
        assert!(hit.cached);
        assert_eq!(hit.content, "4");
        assert_eq!(hit.tier, 2);

        // The stored copy is still unmarked.
        let stored = cache.read().peek("k").unwrap().response.clone();
        assert!(!stored.cached);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_get_evicts_and_misses() {
        let cache = ResponseCache::new(Duration::from_secs(300), 10);
        let key = CacheKey::from("k");
        cache.set(&key, &response("4"));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get(&key).is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.read().len(), 0);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_only_old_entries() {
        let cache = ResponseCache::new(Duration::from_secs(300), 10);
        cache.set(&CacheKey::from("old"), &response("a"));
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.set(&CacheKey::from("new"), &response("b"));
        tokio::time::advance(Duration::from_secs(100)).await;

        assert_eq!(cache.cleanup(), 1);
        assert!(cache.get(&CacheKey::from("new")).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_below_capacity_leaves_expired_entries_to_cleanup() {
        let cache = ResponseCache::new(Duration::from_secs(300), 1000);
        cache.set(&CacheKey::from("old"), &response("a"));
        tokio::time::advance(Duration::from_secs(301)).await;

        cache.set(&CacheKey::from("new"), &response("b"));
        assert_eq!(cache.read().len(), 2);
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.read().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cache_purges_expired_before_evicting_live() {
        let cache = ResponseCache::new(Duration::from_secs(300), 2);
        cache.set(&CacheKey::from("stale"), &response("a"));
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.set(&CacheKey::from("live"), &response("b"));
        assert!(cache.get(&CacheKey::from("stale")).is_some());
        tokio::time::advance(Duration::from_secs(150)).await;

        // "stale" was read most recently but has expired; "live" must survive.
        cache.set(&CacheKey::from("fresh"), &response("c"));
        assert!(cache.read().peek("stale").is_none());
        assert!(cache.get(&CacheKey::from("live")).is_some());
        assert!(cache.get(&CacheKey::from("fresh")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_cleanup_runs_on_timer() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(300), 10));
        let handle = spawn_cleanup(&cache, Duration::from_secs(60));
        cache.set(&CacheKey::from("k"), &response("a"));

        tokio::time::sleep(Duration::from_secs(361)).await;
        assert_eq!(cache.read().len(), 0);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_exits_when_cache_dropped() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(300), 10));
        let handle = spawn_cleanup(&cache, Duration::from_secs(1));
        drop(cache);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("cleanup task should stop")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cache_evicts_least_recently_read() {
        let cache = ResponseCache::new(Duration::from_secs(300), 2);
        cache.set(&CacheKey::from("a"), &response("a"));
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.set(&CacheKey::from("b"), &response("b"));
        tokio::time::advance(Duration::from_millis(10)).await;
        assert!(cache.get(&CacheKey::from("a")).is_some());

        cache.set(&CacheKey::from("c"), &response("c"));
        assert!(cache.get(&CacheKey::from("a")).is_some());
        assert!(cache.get(&CacheKey::from("b")).is_none());
        assert!(cache.get(&CacheKey::from("c")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_empties_store() {
        let cache = ResponseCache::new(Duration::from_secs(300), 10);
        cache.set(&CacheKey::from("a"), &response("a"));
        cache.set(&CacheKey::from("b"), &response("b"));
        assert_eq!(cache.stats().size, 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
