//! Recency List Module
//!
//! Doubly linked list of cache entries ordered from most to least recently
//! used. Entries live in an arena and link to each other by [`Handle`], so
//! detach and reattach are O(1) without any shared references.

use std::ops::Index;

use crate::cache::entry::{CacheEntry, Handle};

// == Recency List ==
/// Tracks access order for LRU eviction.
///
/// - Head = most recently used
/// - Tail = least recently used
#[derive(Debug)]
pub struct RecencyList<K, V> {
    /// Entry slots, None when free
    slots: Vec<Option<CacheEntry<K, V>>>,
    /// Recycled slot indices
    free: Vec<usize>,
    head: Option<Handle>,
    tail: Option<Handle>,
    len: usize,
}

impl<K, V> Default for RecencyList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RecencyList<K, V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Attaches a brand-new entry at the head and returns its handle.
    pub fn push_front(&mut self, mut entry: CacheEntry<K, V>) -> Handle {
        entry.prev = None;
        entry.next = None;

        let handle = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(entry);
                Handle(index)
            }
            None => {
                self.slots.push(Some(entry));
                Handle(self.slots.len() - 1)
            }
        };

        self.link_front(handle);
        self.len += 1;
        handle
    }

    // == Move To Front ==
    /// Marks an entry as used by moving it to the head.
    ///
    /// No-op when the entry is already the head.
    pub fn move_to_front(&mut self, handle: Handle) {
        if self.head == Some(handle) {
            return;
        }
        self.unlink(handle);
        self.link_front(handle);
    }

    // == Detach ==
    /// Unlinks an entry from wherever it sits and releases its slot.
    ///
    /// The returned entry has its link fields cleared.
    pub fn detach(&mut self, handle: Handle) -> Option<CacheEntry<K, V>> {
        self.slots.get(handle.0)?.as_ref()?;

        self.unlink(handle);
        let entry = self.slots[handle.0].take()?;
        debug_assert!(entry.is_unlinked());
        self.free.push(handle.0);
        self.len -= 1;
        Some(entry)
    }

    // == Pop Back ==
    /// Detaches and returns the least recently used entry.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<CacheEntry<K, V>> {
        let tail = self.tail?;
        self.detach(tail)
    }

    // == Peek ==
    /// Returns the most recently used entry's handle.
    pub fn peek_front(&self) -> Option<Handle> {
        self.head
    }

    /// Returns the least recently used entry's handle.
    pub fn peek_back(&self) -> Option<Handle> {
        self.tail
    }

    /// Returns the neighbour towards the tail.
    pub fn next_of(&self, handle: Handle) -> Option<Handle> {
        self.get(handle).and_then(|entry| entry.next)
    }

    // == Access ==
    pub fn get(&self, handle: Handle) -> Option<&CacheEntry<K, V>> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut CacheEntry<K, V>> {
        self.slots.get_mut(handle.0).and_then(Option::as_mut)
    }

    // == Clear ==
    /// Drops every entry and resets the arena.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn link_front(&mut self, handle: Handle) {
        let old_head = self.head;
        if let Some(entry) = self.get_mut(handle) {
            entry.prev = None;
            entry.next = old_head;
        }

        match old_head.and_then(|head| self.get_mut(head)) {
            Some(head) => head.prev = Some(handle),
            None => self.tail = Some(handle),
        }

        self.head = Some(handle);
    }

    fn unlink(&mut self, handle: Handle) {
        let (prev, next) = match self.get_mut(handle) {
            Some(entry) => (entry.prev.take(), entry.next.take()),
            None => return,
        };

        match prev.and_then(|prev| self.get_mut(prev)) {
            Some(prev_entry) => prev_entry.next = next,
            None => self.head = next,
        }

        match next.and_then(|next| self.get_mut(next)) {
            Some(next_entry) => next_entry.prev = prev,
            None => self.tail = prev,
        }
    }
}

impl<K, V> Index<Handle> for RecencyList<K, V> {
    type Output = CacheEntry<K, V>;

    /// Panics on a stale handle.
    fn index(&self, handle: Handle) -> &Self::Output {
        match self.get(handle) {
            Some(entry) => entry,
            None => panic!("stale recency list handle {:?}", handle),
        }
    }
}
