//! Bounded LRU cache from final SQL text to a prepared statement handle.
//!
//! Recency is tracked with a generation counter: touching an entry is O(1),
//! eviction scans for the oldest unpinned entry.
//!
//! Entries can be pinned, which exempts them from eviction until unpinned.
//! When every entry is pinned, inserts overrun the capacity instead of
//! evicting. Evicted and cleared handles are dropped, which releases them.

use crate::config::StatementCacheConfig;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counters reported by [`StatementCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub pinned: usize,
}

#[derive(Debug)]
struct Entry<H> {
    handle: H,
    pinned: bool,
    last_used: u64,
}

#[derive(Debug)]
struct CacheInner<H> {
    capacity: usize,
    map: HashMap<String, Entry<H>>,
    generation: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Thread-safe statement cache.
#[derive(Debug)]
pub struct StatementCache<H> {
    inner: Mutex<CacheInner<H>>,
}

impl<H: Clone> StatementCache<H> {
    /// Create a cache holding up to `capacity` entries. 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                capacity,
                map: HashMap::new(),
                generation: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    pub fn from_config(config: &StatementCacheConfig) -> Self {
        Self::new(config.effective_capacity())
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<H>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `sql`, marking the entry most recently used on a hit.
    pub fn get(&self, sql: &str) -> Option<H> {
        let mut inner = self.lock();
        let generation = inner.next_generation();
        let Some(entry) = inner.map.get_mut(sql) else {
            inner.misses += 1;
            tracing::trace!(target: "sqlweave.cache", hit = false, "statement cache miss");
            return None;
        };
        entry.last_used = generation;
        let handle = entry.handle.clone();
        inner.hits += 1;
        tracing::trace!(target: "sqlweave.cache", hit = true, "statement cache hit");
        Some(handle)
    }

    /// Insert or replace `sql`. Replacing keeps the entry's pin.
    pub fn set(&self, sql: impl Into<String>, handle: H) {
        let sql = sql.into();
        let mut inner = self.lock();
        if inner.capacity == 0 {
            return;
        }

        let generation = inner.next_generation();
        if let Some(entry) = inner.map.get_mut(&sql) {
            entry.handle = handle;
            entry.last_used = generation;
            return;
        }

        while inner.map.len() >= inner.capacity && inner.evict_one() {}
        inner.map.insert(
            sql,
            Entry {
                handle,
                pinned: false,
                last_used: generation,
            },
        );
    }

    /// Exempt `sql` from eviction. Returns false if it is not cached.
    pub fn pin(&self, sql: &str) -> bool {
        self.set_pinned(sql, true)
    }

    /// Make `sql` evictable again. Returns false only if it is not cached.
    pub fn unpin(&self, sql: &str) -> bool {
        self.set_pinned(sql, false)
    }

    fn set_pinned(&self, sql: &str, pinned: bool) -> bool {
        let mut inner = self.lock();
        match inner.map.get_mut(sql) {
            Some(entry) => {
                entry.pinned = pinned;
                tracing::debug!(target: "sqlweave.cache", pinned, "statement pin changed");
                true
            }
            None => false,
        }
    }

    pub fn is_pinned(&self, sql: &str) -> bool {
        self.lock().map.get(sql).is_some_and(|e| e.pinned)
    }

    /// Remove a single entry, returning its handle.
    pub fn remove(&self, sql: &str) -> Option<H> {
        let mut inner = self.lock();
        inner.map.remove(sql).map(|e| e.handle)
    }

    /// Drop every cached handle, pinned ones included.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let released = inner.map.len();
        inner.map.clear();
        tracing::debug!(target: "sqlweave.cache", released, "statement cache cleared");
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size: inner.map.len(),
            pinned: inner.map.values().filter(|e| e.pinned).count(),
        }
    }
}

impl<H> CacheInner<H> {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Evict the least recently used unpinned entry. Returns false when
    /// every entry is pinned.
    fn evict_one(&mut self) -> bool {
        let oldest = self
            .map
            .iter()
            .filter(|(_, e)| !e.pinned)
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| k.clone());

        match oldest {
            Some(key) => {
                self.map.remove(&key);
                self.evictions += 1;
                tracing::debug!(target: "sqlweave.cache", "evicted least recently used statement");
                true
            }
            None => {
                tracing::debug!(
                    target: "sqlweave.cache",
                    size = self.map.len(),
                    "all entries pinned, exceeding capacity"
                );
                false
            }
        }
    }
}
