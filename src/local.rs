//! Bounded in-memory tier with LRU eviction
//!
//! A map of at most `capacity` entries paired with a key ring that records
//! recency, newest at the head. Accessing a key promotes it to the head;
//! inserting into a full cache evicts the ring's oldest key, which leaves
//! the map in the same step.

use crate::error::{Result, StratumError};
use crate::ring::CircularBuffer;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Hit/miss counters for the local tier.
#[derive(Debug, Clone, Copy)]
pub struct LocalCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

impl LocalCacheStats {
    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Bounded key-value map whose eviction order is tracked by a recency ring.
///
/// Invariant: the map's key set and the ring's elements are identical at
/// every step, so `len() <= capacity` always holds.
#[derive(Debug)]
pub struct LocalCache<K, V> {
    map: HashMap<K, V>,
    ring: CircularBuffer<K>,
    hits: u64,
    misses: u64,
}

impl<K, V> LocalCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be greater than 0");

        LocalCache {
            map: HashMap::with_capacity(capacity),
            ring: CircularBuffer::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Insert a key that is not yet present. When the cache is full the
    /// least-recently-used entry is evicted and returned.
    pub fn add_or_overwrite(&mut self, key: K, value: V) -> Option<(K, V)> {
        debug_assert!(!self.map.contains_key(&key), "key is already cached");

        let displaced = self
            .ring
            .enqueue(key.clone())
            .expect("ring capacity is validated at construction");

        let evicted = displaced.map(|old_key| {
            let old_value = self
                .map
                .remove(&old_key)
                .expect("ring and map track the same keys");
            (old_key, old_value)
        });

        self.map.insert(key, value);
        evicted
    }

    /// Move `key` to the most-recent position of the ring.
    fn promote(&mut self, key: &K) {
        if self.ring.len() <= 1 {
            return;
        }

        let found = self.ring.iter().position(|k| k == key);
        if let Some(position) = found {
            if position + 1 == self.ring.len() {
                return;
            }
            let key = self
                .ring
                .remove_at(position)
                .expect("position was found in the ring");
            self.ring
                .enqueue(key)
                .expect("ring capacity is validated at construction");
        }
    }

    /// Look up and promote. Returns the value, or `None` on a miss.
    pub fn try_get(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        if !self.map.contains_key(key) {
            self.misses += 1;
            return None;
        }

        self.hits += 1;
        self.promote(key);
        self.map.get(key).cloned()
    }

    pub fn get(&mut self, key: &K) -> Result<V>
    where
        V: Clone,
    {
        self.try_get(key)
            .ok_or_else(|| StratumError::KeyNotFound(format!("{key:?}")))
    }

    /// Overwrite the value of a present key, promoting it.
    pub fn set(&mut self, key: &K, value: V) -> Result<()> {
        if !self.map.contains_key(key) {
            return Err(StratumError::KeyNotFound(format!("{key:?}")));
        }

        self.promote(key);
        self.map.insert(key.clone(), value);
        Ok(())
    }

    /// Remove an entry from map and ring. Returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        if self.map.remove(key).is_none() {
            return false;
        }

        let found = self.ring.iter().position(|k| k == key);
        if let Some(position) = found {
            let _ = self.ring.remove_at(position);
        }
        true
    }

    /// Membership test; does not promote.
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Entries oldest-first; does not promote.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.ring.iter().filter_map(|key| {
            self.map.get(key).map(|value| (key, value))
        })
    }

    /// Keys oldest-first.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.ring.iter()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.ring.clear();
    }

    pub fn stats(&self) -> LocalCacheStats {
        LocalCacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.len(),
            capacity: self.capacity(),
        }
    }
}
