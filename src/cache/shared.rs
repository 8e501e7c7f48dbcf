//! Shared Cache Module
//!
//! Mutex-guarded handle for using one cache from several threads.

use std::borrow::Borrow;
use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::cache::clock::{Clock, MonotonicClock};
use crate::cache::stats::CacheStats;
use crate::cache::store::{EvictionCallback, TtlCache};
use crate::error::Result;

type Pending<K, V> = Arc<Mutex<Vec<(K, V)>>>;

// == Delivery ==
/// Hands evictions to the user callback in the order they happened.
///
/// Each call that evicted something takes a ticket while it still holds the
/// cache lock, then waits for its turn to run the callback.
struct Delivery<K, V> {
    callback: Mutex<Option<EvictionCallback<K, V>>>,
    queue: Mutex<Queue<K, V>>,
    turn: Condvar,
}

struct Queue<K, V> {
    /// Evictions left undelivered by a callback that panicked
    backlog: VecDeque<(K, V)>,
    issued: u64,
    serving: u64,
}

impl<K, V> Delivery<K, V> {
    fn new(callback: Option<EvictionCallback<K, V>>) -> Self {
        Self {
            callback: Mutex::new(callback),
            queue: Mutex::new(Queue {
                backlog: VecDeque::new(),
                issued: 0,
                serving: 0,
            }),
            turn: Condvar::new(),
        }
    }
}

/// One call's turn at the callback. Whatever is still in `batch` when the
/// turn ends goes back to the front of the backlog.
struct Turn<'a, K, V> {
    delivery: &'a Delivery<K, V>,
    batch: VecDeque<(K, V)>,
}

impl<K, V> Drop for Turn<'_, K, V> {
    fn drop(&mut self) {
        let mut queue = self.delivery.queue.lock();
        while let Some(pair) = self.batch.pop_back() {
            queue.backlog.push_front(pair);
        }
        queue.serving += 1;
        drop(queue);
        self.delivery.turn.notify_all();
    }
}

// == Shared Cache ==
/// Cloneable, thread-safe handle around a [`TtlCache`].
///
/// Every operation holds the cache lock for its whole duration, so the index
/// and the recency list are never observed half-updated. Values are returned
/// by clone.
///
/// Evictions are buffered while the lock is held and handed to the callback
/// after it is released. Each call delivers the evictions it caused, in
/// eviction order across all clones. If the callback panics, the panic
/// reaches the call that triggered it and the pairs not yet delivered are
/// handed over first by the next call that delivers.
///
/// The callback may call back into the same `SharedCache`, as long as that
/// nested call does not itself evict anything.
pub struct SharedCache<K, V, C = MonotonicClock> {
    inner: Arc<Mutex<TtlCache<K, V, C>>>,
    pending: Pending<K, V>,
    delivery: Arc<Delivery<K, V>>,
}

impl<K, V, C> Clone for SharedCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            pending: Arc::clone(&self.pending),
            delivery: Arc::clone(&self.delivery),
        }
    }
}

impl<K, V, C> SharedCache<K, V, C>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
    C: Clock,
{
    // == Constructor ==
    /// Wraps `cache`, taking over its eviction callback.
    pub fn new(mut cache: TtlCache<K, V, C>) -> Self {
        let pending: Pending<K, V> = Arc::default();
        let sink = Arc::clone(&pending);
        let callback = cache.set_callback(Some(Box::new(move |key, value| {
            sink.lock().push((key, value));
        })));

        Self {
            inner: Arc::new(Mutex::new(cache)),
            pending,
            delivery: Arc::new(Delivery::new(callback)),
        }
    }

    /// Replaces the eviction callback; `None` removes it.
    pub fn set_callback(&self, callback: Option<EvictionCallback<K, V>>) {
        *self.delivery.callback.lock() = callback;
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.with(|cache| cache.get(key).cloned())
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.with(|cache| cache.contains_key(key))
    }

    pub fn set(&self, key: K, value: V) {
        self.with(|cache| cache.set(key, value));
    }

    pub fn set_with_ttl(&self, key: K, value: V, ttl: Option<Duration>) {
        self.with(|cache| cache.set_with_ttl(key, value, ttl));
    }

    pub fn delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.with(|cache| cache.delete(key))
    }

    pub fn remove<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.with(|cache| cache.remove(key))
    }

    pub fn peek_front(&self) -> Option<(K, V)> {
        self.with(|cache| {
            cache
                .peek_front()
                .map(|(key, value)| (key.clone(), value.clone()))
        })
    }

    pub fn peek_back(&self) -> Option<(K, V)> {
        self.with(|cache| {
            cache
                .peek_back()
                .map(|(key, value)| (key.clone(), value.clone()))
        })
    }

    pub fn pop(&self, prefer_least_recent: bool) -> Result<(K, V)> {
        self.with(|cache| cache.pop(prefer_least_recent))
    }

    pub fn resize(&self, new_capacity: usize) -> Result<()> {
        self.with(|cache| cache.resize(new_capacity))
    }

    pub fn clear(&self) {
        self.with(|cache| cache.clear());
    }

    pub fn keys(&self) -> Vec<K> {
        self.with(|cache| cache.keys().into_iter().cloned().collect())
    }

    pub fn values(&self) -> Vec<V> {
        self.with(|cache| cache.values().into_iter().cloned().collect())
    }

    pub fn items(&self) -> Vec<(K, V)> {
        self.with(|cache| {
            cache
                .items()
                .into_iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
    }

    pub fn purge_expired(&self) -> usize {
        self.with(|cache| cache.purge_expired())
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Runs `op` under the cache lock, then delivers the evictions it caused.
    fn with<R>(&self, op: impl FnOnce(&mut TtlCache<K, V, C>) -> R) -> R {
        let (result, ticket, evicted) = {
            let mut cache = self.inner.lock();
            let result = op(&mut cache);
            let evicted = std::mem::take(&mut *self.pending.lock());

            let mut queue = self.delivery.queue.lock();
            if evicted.is_empty() && queue.backlog.is_empty() {
                return result;
            }
            let ticket = queue.issued;
            queue.issued += 1;
            (result, ticket, evicted)
        };

        self.deliver(ticket, evicted);
        result
    }

    fn deliver(&self, ticket: u64, evicted: Vec<(K, V)>) {
        let mut queue = self.delivery.queue.lock();
        while queue.serving != ticket {
            self.delivery.turn.wait(&mut queue);
        }
        let mut batch = std::mem::take(&mut queue.backlog);
        drop(queue);

        batch.extend(evicted);
        let mut turn = Turn {
            delivery: &self.delivery,
            batch,
        };

        let mut callback = self.delivery.callback.lock();
        while let Some((key, value)) = turn.batch.pop_front() {
            if let Some(callback) = callback.as_mut() {
                callback(key, value);
            }
        }
    }
}
