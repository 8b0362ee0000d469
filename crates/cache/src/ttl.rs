//! Generic key/value cache with per-entry expiry.

use crate::clock::{Clock, SystemClock};
use dashmap::DashMap;
use regex::Regex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::trace;

/// Longest lifetime an entry can get; larger TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A cached value and the instant after which it is no longer served.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing valid.
    pub misses: u64,
    /// Entries removed because they had expired.
    pub expirations: u64,
    /// Entries currently stored, expired or not.
    pub size: usize,
}

/// In-memory TTL cache keyed by string.
///
/// Entries are only removed by explicit deletion, by a lookup that finds them
/// expired, or by [`TtlCache::cleanup`]. There is no size bound.
pub struct TtlCache<V> {
    /// Stored entries.
    entries: DashMap<String, CacheEntry<V>>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Hit counter.
    hits: AtomicU64,
    /// Miss counter.
    misses: AtomicU64,
    /// Expired entries removed.
    expirations: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a new cache using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a new cache reading time from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    ///
    /// `ttl` is clamped to [`MAX_TTL`].
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let now = self.clock.now();
        let expires_at = now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now);
        self.entries
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Returns the value for `key` if it has not expired.
    ///
    /// An expired entry is deleted on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let value = match self.entries.get(key) {
            Some(entry) if now <= entry.expires_at => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return value;
        }

        // Re-check under the write lock: a concurrent `set` may have refreshed it.
        if self
            .entries
            .remove_if(key, |_, entry| now > entry.expires_at)
            .is_some()
        {
            self.expirations.fetch_add(1, Ordering::Relaxed);
            trace!(key = key, "Expired cache entry removed on read");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Whether `key` holds a valid entry. Does not touch counters or evict.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .get(key)
            .is_some_and(|entry| now <= entry.expires_at)
    }

    /// Deletes `key`. Returns whether an entry existed.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Deletes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deletes exactly the entries whose expiry is strictly before now.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0usize;
        self.entries.retain(|_, entry| {
            let keep = entry.expires_at >= now;
            if !keep {
                removed += 1;
            }
            keep
        });
        self.expirations
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Deletes every key matching `pattern`. Returns the number removed.
    pub fn invalidate_pattern(&self, pattern: &Regex) -> usize {
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| pattern.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        matching
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count()
    }

    /// Deletes every key starting with `prefix`. Returns the number removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        match Regex::new(&format!("^{}", regex::escape(prefix))) {
            Ok(pattern) => self.invalidate_pattern(&pattern),
            Err(_) => 0,
        }
    }

    /// Returns the cached value or computes, stores and returns a fresh one.
    ///
    /// `fetch` is not called when a valid entry exists. A failed fetch is
    /// propagated and nothing is stored.
    ///
    /// # Errors
    /// Returns whatever error `fetch` produced.
    pub async fn get_or_set<F, Fut, E>(&self, key: &str, ttl: Duration, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = fetch().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Snapshot of the cache counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            size: self.entries.len(),
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}
