//! Coarse-grained concurrency adapter
//!
//! The core is single-threaded by design; this wrapper serializes every
//! public operation behind one mutex so a dictionary can be shared across
//! threads. No finer-grained locking exists, and none would be correct.

use crate::error::Result;
use crate::heap::HeapStats;
use crate::tiered::{CachingDictionary, TierStats};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::hash::Hash;

pub struct SharedDictionary<K, V> {
    inner: Mutex<CachingDictionary<K, V>>,
}

impl<K, V> SharedDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(dictionary: CachingDictionary<K, V>) -> Self {
        SharedDictionary {
            inner: Mutex::new(dictionary),
        }
    }

    pub fn add(&self, key: K, value: V) -> Result<()> {
        self.inner.lock().add(key, value)
    }

    pub fn try_get(&self, key: &K) -> Result<Option<V>> {
        self.inner.lock().try_get(key)
    }

    pub fn get(&self, key: &K) -> Result<V> {
        self.inner.lock().get(key)
    }

    pub fn set(&self, key: &K, value: V) -> Result<()> {
        self.inner.lock().set(key, value)
    }

    pub fn remove(&self, key: &K) -> Result<bool> {
        self.inner.lock().remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Snapshot of every entry, local tier first. The lock is held for the
    /// whole snapshot, not across the caller's iteration.
    pub fn entries(&self) -> Result<Vec<(K, V)>> {
        self.inner.lock().entries()
    }

    pub fn clear(&self) -> Result<()> {
        self.inner.lock().clear()
    }

    pub fn stats(&self) -> TierStats {
        self.inner.lock().stats()
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.inner.lock().heap_stats()
    }

    pub fn dispose(&self) -> Result<()> {
        self.inner.lock().dispose()
    }
}
