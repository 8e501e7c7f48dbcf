//! Cache Store Module
//!
//! Main cache engine combining the key index with the recency list, LRU
//! eviction and lazy TTL expiration.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use tracing::debug;

use crate::cache::clock::{Clock, MonotonicClock};
use crate::cache::entry::{CacheEntry, Handle};
use crate::cache::index::KeyIndex;
use crate::cache::list::RecencyList;
use crate::cache::stats::CacheStats;
use crate::cache::MAX_PREALLOCATED_ENTRIES;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Callback invoked with the key and value of every entry removed by
/// capacity pressure or TTL expiry.
pub type EvictionCallback<K, V> = Box<dyn FnMut(K, V) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Capacity,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Front,
    Back,
}

// == TTL Cache ==
/// Fixed-capacity cache with LRU eviction and per-entry TTL.
///
/// The cache is a single-owner structure: every operation takes `&mut self`
/// and runs to completion. Wrap it in [`SharedCache`](crate::cache::SharedCache)
/// or an external lock to share it between threads.
///
/// Expired entries are removed lazily, whenever a lookup, peek or ordered
/// walk encounters them. The eviction callback fires for capacity evictions
/// and expirations only; `delete`, `pop` and `clear` never invoke it. By the
/// time the callback runs, the entry is already gone from both the index and
/// the recency list.
pub struct TtlCache<K, V, C = MonotonicClock> {
    index: KeyIndex<K>,
    list: RecencyList<K, V>,
    stats: CacheStats,
    capacity: usize,
    default_ttl: Option<Duration>,
    on_evict: Option<EvictionCallback<K, V>>,
    clock: C,
}

impl<K, V> TtlCache<K, V, MonotonicClock>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new cache backed by the real monotonic clock.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of live entries, must be positive
    /// * `default_ttl` - TTL applied by [`set`](Self::set), None = never expires
    pub fn new(capacity: usize, default_ttl: Option<Duration>) -> Result<Self> {
        Self::with_clock(capacity, default_ttl, MonotonicClock::new())
    }

    /// Creates a new cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.capacity, config.default_ttl())
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    /// Creates a new cache reading time from `clock`.
    pub fn with_clock(capacity: usize, default_ttl: Option<Duration>, clock: C) -> Result<Self> {
        validate_capacity(capacity)?;
        let prealloc = capacity.min(MAX_PREALLOCATED_ENTRIES);

        Ok(Self {
            index: KeyIndex::with_capacity(prealloc),
            list: RecencyList::with_capacity(prealloc),
            stats: CacheStats::new(),
            capacity,
            default_ttl,
            on_evict: None,
            clock,
        })
    }

    /// Installs the eviction callback, consuming and returning the cache.
    pub fn on_evict<F>(mut self, callback: F) -> Self
    where
        F: FnMut(K, V) + Send + 'static,
    {
        self.on_evict = Some(Box::new(callback));
        self
    }

    // == Set Callback ==
    /// Replaces the eviction callback; `None` removes it. Returns the
    /// previous callback.
    pub fn set_callback(
        &mut self,
        callback: Option<EvictionCallback<K, V>>,
    ) -> Option<EvictionCallback<K, V>> {
        std::mem::replace(&mut self.on_evict, callback)
    }

    pub fn has_callback(&self) -> bool {
        self.on_evict.is_some()
    }

    // == Get ==
    /// Retrieves a live value and marks it as most recently used.
    ///
    /// An expired entry is evicted (with callback) and reported as a miss.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_nanos();
        let Some(handle) = self.live_handle(key, now) else {
            self.stats.record_miss();
            return None;
        };

        self.list.move_to_front(handle);
        self.stats.record_hit();
        Some(&self.list[handle].value)
    }

    /// Like [`get`](Self::get), falling back to `default` on a miss.
    pub fn get_or<'a, Q>(&'a mut self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Returns the live value for `key`, inserting `make()` with the default
    /// TTL if there is none. Counts as a hit or a miss like `get`.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &V
    where
        F: FnOnce() -> V,
    {
        let now = self.clock.now_nanos();
        let handle = match self.live_handle(&key, now) {
            Some(handle) => {
                self.list.move_to_front(handle);
                self.stats.record_hit();
                handle
            }
            None => {
                self.stats.record_miss();
                let ttl = self.default_ttl;
                self.insert_new(key, make(), ttl, now)
            }
        };

        &self.list[handle].value
    }

    // == Contains ==
    /// Checks for a live entry without touching recency or statistics.
    ///
    /// Expired entries are still cleaned up (with callback).
    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_nanos();
        self.live_handle(key, now).is_some()
    }

    /// Remaining lifetime of a live entry: `Some(None)` when it never expires,
    /// `None` when there is no live entry. Does not promote.
    pub fn ttl_remaining<Q>(&mut self, key: &Q) -> Option<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_nanos();
        let handle = self.live_handle(key, now)?;
        Some(self.list[handle].ttl_remaining(now))
    }

    // == Set ==
    /// Stores a key-value pair with the default TTL.
    pub fn set(&mut self, key: K, value: V) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Stores a key-value pair with an explicit TTL (`None` = never expires).
    ///
    /// An existing key gets its value replaced, its deadline recomputed and
    /// is promoted to most recently used. A new key that pushes the cache
    /// over capacity evicts exactly one least recently used entry.
    pub fn set_with_ttl(&mut self, key: K, value: V, ttl: Option<Duration>) {
        let now = self.clock.now_nanos();

        if let Some(handle) = self.index.lookup(&key) {
            if let Some(entry) = self.list.get_mut(handle) {
                entry.refresh(value, ttl, now);
            }
            self.list.move_to_front(handle);
            return;
        }

        self.insert_new(key, value, ttl, now);
    }

    // == Delete ==
    /// Removes an entry by key and returns its value.
    ///
    /// Caller-directed, so the eviction callback is never invoked. A key whose
    /// TTL has elapsed is dropped and reported as absent.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_nanos();
        let handle = self.index.lookup(key)?;
        let entry = self.take(handle)?;
        if entry.is_expired(now) {
            return None;
        }
        Some(entry.value)
    }

    /// Strict removal: `KeyNotFound` when there is no live entry.
    ///
    /// Unlike [`delete`](Self::delete), an expired entry goes through the
    /// expiry path and reaches the callback.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_nanos();
        self.live_handle(key, now)
            .and_then(|handle| self.take(handle))
            .map(|entry| entry.value)
            .ok_or(CacheError::KeyNotFound)
    }

    // == Peek ==
    /// Returns the most recently used live entry without changing order or
    /// statistics. Expired entries found at the head are evicted first.
    pub fn peek_front(&mut self) -> Option<(&K, &V)> {
        let now = self.clock.now_nanos();
        let handle = self.first_live(End::Front, now)?;
        let entry = &self.list[handle];
        Some((&entry.key, &entry.value))
    }

    /// Returns the least recently used live entry without changing order or
    /// statistics. Expired entries found at the tail are evicted first.
    pub fn peek_back(&mut self) -> Option<(&K, &V)> {
        let now = self.clock.now_nanos();
        let handle = self.first_live(End::Back, now)?;
        let entry = &self.list[handle];
        Some((&entry.key, &entry.value))
    }

    // == Pop ==
    /// Removes and returns the least (`true`) or most (`false`) recently used
    /// live entry. No callback is invoked.
    pub fn pop(&mut self, prefer_least_recent: bool) -> Result<(K, V)> {
        let now = self.clock.now_nanos();
        let end = if prefer_least_recent {
            End::Back
        } else {
            End::Front
        };

        let handle = self.first_live(end, now).ok_or(CacheError::EmptyCache)?;
        self.take(handle)
            .map(CacheEntry::into_pair)
            .ok_or(CacheError::EmptyCache)
    }

    // == Resize ==
    /// Changes the capacity, evicting least recently used entries (with
    /// callback) until the cache fits.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        validate_capacity(new_capacity)?;

        let mut evicted = 0;
        while self.list.len() > new_capacity {
            self.evict_lru();
            evicted += 1;
        }
        self.capacity = new_capacity;

        if evicted > 0 {
            debug!(
                "Resized cache to {} entries, evicted {}",
                new_capacity, evicted
            );
        }
        Ok(())
    }

    // == Clear ==
    /// Drops every entry without invoking the callback and resets statistics.
    pub fn clear(&mut self) {
        let dropped = self.list.len();
        self.list.clear();
        self.index.clear();
        self.stats = CacheStats::new();
        debug!("Cleared cache, dropped {} entries", dropped);
    }

    // == Ordered Views ==
    /// Keys of all live entries, most recently used first.
    pub fn keys(&mut self) -> Vec<&K> {
        let live = self.sweep();
        live.into_iter().map(|handle| &self.list[handle].key).collect()
    }

    /// Values of all live entries, most recently used first.
    pub fn values(&mut self) -> Vec<&V> {
        let live = self.sweep();
        live.into_iter()
            .map(|handle| &self.list[handle].value)
            .collect()
    }

    /// Key-value pairs of all live entries, most recently used first.
    pub fn items(&mut self) -> Vec<(&K, &V)> {
        let live = self.sweep();
        live.into_iter()
            .map(|handle| {
                let entry = &self.list[handle];
                (&entry.key, &entry.value)
            })
            .collect()
    }

    // == Purge Expired ==
    /// Evicts every expired entry (with callback).
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let before = self.list.len();
        self.sweep();
        let removed = before - self.list.len();
        if removed > 0 {
            debug!("TTL purge: removed {} expired entries", removed);
        }
        removed
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats;
        stats.set_total_entries(self.list.len());
        stats
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Returns the number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.list.len(), self.index.len());
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        debug_assert_eq!(self.list.is_empty(), self.index.is_empty());
        self.list.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn index_len(&self) -> usize {
        self.index.len()
    }

    #[cfg(test)]
    pub(crate) fn list_len(&self) -> usize {
        self.list.len()
    }

    // == Internals ==
    fn insert_new(&mut self, key: K, value: V, ttl: Option<Duration>, now: u64) -> Handle {
        let handle = self
            .list
            .push_front(CacheEntry::new(key.clone(), value, ttl, now));
        self.index.insert(key, handle);

        if self.list.len() > self.capacity {
            self.evict_lru();
        }
        handle
    }

    /// Handle of the entry for `key` if it is live; an expired entry is
    /// evicted on the way.
    fn live_handle<Q>(&mut self, key: &Q, now: u64) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.lookup(key)?;
        if self.list[handle].is_expired(now) {
            self.evict(handle, Removal::Expired);
            return None;
        }
        Some(handle)
    }

    /// Scans inward from one end, evicting expired entries until a live one
    /// is found.
    fn first_live(&mut self, end: End, now: u64) -> Option<Handle> {
        loop {
            let handle = match end {
                End::Front => self.list.peek_front(),
                End::Back => self.list.peek_back(),
            }?;

            if !self.list[handle].is_expired(now) {
                return Some(handle);
            }
            self.evict(handle, Removal::Expired);
        }
    }

    /// Walks the list once from the head, evicting expired entries and
    /// returning the handles of the live ones in order.
    fn sweep(&mut self) -> Vec<Handle> {
        let now = self.clock.now_nanos();
        let mut live = Vec::with_capacity(self.list.len());
        let mut cursor = self.list.peek_front();

        while let Some(handle) = cursor {
            cursor = self.list.next_of(handle);
            if self.list[handle].is_expired(now) {
                self.evict(handle, Removal::Expired);
            } else {
                live.push(handle);
            }
        }
        live
    }

    fn evict_lru(&mut self) {
        if let Some(entry) = self.list.pop_back() {
            self.index.remove(&entry.key);
            self.report(entry, Removal::Capacity);
        }
    }

    fn evict(&mut self, handle: Handle, removal: Removal) {
        if let Some(entry) = self.take(handle) {
            self.report(entry, removal);
        }
    }

    /// Records a removed entry and runs the callback. The entry is already
    /// gone from both the index and the list.
    fn report(&mut self, entry: CacheEntry<K, V>, removal: Removal) {
        match removal {
            Removal::Capacity => {
                self.stats.record_eviction();
                debug!("Evicted least recently used entry, {} remain", self.list.len());
            }
            Removal::Expired => {
                self.stats.record_expiration();
                debug!("Expired entry removed, {} remain", self.list.len());
            }
        }

        if let Some(callback) = self.on_evict.as_mut() {
            let (key, value) = entry.into_pair();
            callback(key, value);
        }
    }

    fn take(&mut self, handle: Handle) -> Option<CacheEntry<K, V>> {
        let entry = self.list.detach(handle)?;
        self.index.remove(&entry.key);
        Some(entry)
    }
}

impl<K, V, C> Extend<(K, V)> for TtlCache<K, V, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    /// Stores every pair with the default TTL, in iteration order.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K, V, C> fmt::Debug for TtlCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("capacity", &self.capacity)
            .field("len", &self.list.len())
            .field("default_ttl", &self.default_ttl)
            .field("stats", &self.stats)
            .field("has_callback", &self.on_evict.is_some())
            .finish()
    }
}

fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(CacheError::InvalidArgument(
            "Capacity should be a positive number".to_string(),
        ));
    }
    Ok(())
}
