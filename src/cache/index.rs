//! Key Index Module
//!
//! Hash lookup from key to the handle of its entry in the recency list.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

use crate::cache::entry::Handle;

// == Key Index ==
/// Pure associative structure; never evicts or expires on its own.
#[derive(Debug)]
pub struct KeyIndex<K> {
    map: HashMap<K, Handle, RandomState>,
}

impl<K: Hash + Eq> KeyIndex<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
        }
    }

    /// Returns the handle stored for `key`.
    pub fn lookup<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).copied()
    }

    /// Inserts or replaces, returning the replaced handle.
    pub fn insert(&mut self, key: K, handle: Handle) -> Option<Handle> {
        self.map.insert(key, handle)
    }

    /// Removes the slot for `key`; no-op if absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.remove(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = KeyIndex::with_capacity(4);

        assert!(index.insert("a".to_string(), Handle(0)).is_none());
        assert_eq!(index.lookup("a"), Some(Handle(0)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_insert_replaces() {
        let mut index = KeyIndex::with_capacity(4);

        index.insert("a", Handle(0));
        let replaced = index.insert("a", Handle(3));

        assert_eq!(replaced, Some(Handle(0)));
        assert_eq!(index.lookup(&"a"), Some(Handle(3)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut index: KeyIndex<u32> = KeyIndex::with_capacity(4);

        index.insert(1, Handle(0));

        assert!(index.remove(&2).is_none());
        assert_eq!(index.len(), 1);
        assert_eq!(index.remove(&1), Some(Handle(0)));
        assert!(index.is_empty());
    }
}
