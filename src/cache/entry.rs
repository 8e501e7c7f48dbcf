//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use crate::cache::clock::duration_to_nanos;

// == Handle ==
/// Stable address of an entry inside the recency list arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub(crate) usize);

// == Cache Entry ==
/// Represents a single cache entry with its key, value and deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// Canonical copy of the key
    pub key: K,
    /// The stored value
    pub value: V,
    /// Absolute deadline in clock nanoseconds, None = no expiration
    pub expire_at: Option<u64>,
    pub(crate) prev: Option<Handle>,
    pub(crate) next: Option<Handle>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new, unlinked cache entry.
    ///
    /// # Arguments
    /// * `key` - The key the entry is indexed under
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL, None = never expires
    /// * `now` - Current clock reading in nanoseconds
    pub fn new(key: K, value: V, ttl: Option<Duration>, now: u64) -> Self {
        Self {
            key,
            value,
            expire_at: deadline(ttl, now),
            prev: None,
            next: None,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired only once the current time is
    /// strictly past its deadline. At the exact deadline it is still live.
    pub fn is_expired(&self, now: u64) -> bool {
        match self.expire_at {
            Some(expire_at) => now > expire_at,
            None => false,
        }
    }

    // == Refresh ==
    /// Replaces the value and recomputes the deadline from `ttl`.
    pub fn refresh(&mut self, value: V, ttl: Option<Duration>, now: u64) -> V {
        self.expire_at = deadline(ttl, now);
        std::mem::replace(&mut self.value, value)
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if the entry never expires.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the deadline has been reached
    /// - `Some(remaining)` if the entry has a deadline in the future
    /// - `None` if the entry has no TTL
    pub fn ttl_remaining(&self, now: u64) -> Option<Duration> {
        self.expire_at
            .map(|expire_at| Duration::from_nanos(expire_at.saturating_sub(now)))
    }

    /// Returns true if the entry is not linked to any neighbour.
    pub fn is_unlinked(&self) -> bool {
        self.prev.is_none() && self.next.is_none()
    }

    /// Consumes the entry, returning its key and value.
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

// == Utility Functions ==
/// Computes the absolute deadline for a TTL starting at `now`.
pub fn deadline(ttl: Option<Duration>, now: u64) -> Option<u64> {
    ttl.map(|ttl| now.saturating_add(duration_to_nanos(ttl)))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("k", "test_value", None, 100);

        assert_eq!(entry.value, "test_value");
        assert!(entry.expire_at.is_none());
        assert!(!entry.is_expired(u64::MAX));
        assert!(entry.is_unlinked());
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new("k", "v", Some(Duration::from_nanos(50)), 100);

        assert_eq!(entry.expire_at, Some(150));
        assert!(!entry.is_expired(120));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("k", "v", Some(Duration::from_nanos(10)), 0);

        assert!(!entry.is_expired(10), "Entry is live at its deadline");
        assert!(entry.is_expired(11), "Entry is expired past its deadline");
    }

    #[test]
    fn test_zero_ttl_expires_on_next_tick() {
        let entry = CacheEntry::new("k", "v", Some(Duration::ZERO), 7);

        assert!(!entry.is_expired(7));
        assert!(entry.is_expired(8));
    }

    #[test]
    fn test_refresh_replaces_value_and_deadline() {
        let mut entry = CacheEntry::new("k", 1, Some(Duration::from_nanos(5)), 0);

        let old = entry.refresh(2, None, 100);

        assert_eq!(old, 1);
        assert_eq!(entry.value, 2);
        assert!(entry.expire_at.is_none());
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("k", "v", Some(Duration::from_nanos(1_000)), 0);

        assert_eq!(entry.ttl_remaining(400), Some(Duration::from_nanos(600)));
        assert_eq!(entry.ttl_remaining(5_000), Some(Duration::ZERO));

        let forever = CacheEntry::new("k", "v", None, 0);
        assert!(forever.ttl_remaining(0).is_none());
    }

    #[test]
    fn test_deadline_saturates() {
        assert_eq!(deadline(Some(Duration::MAX), 10), Some(u64::MAX));
        assert_eq!(deadline(None, 10), None);
    }
}
