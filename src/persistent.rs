//! Persistent tier: key -> handle index over a serializing cache
//!
//! Values live as heap blocks; this dictionary owns the only mapping from
//! external keys to their handles. The index is authoritative and purely
//! in-memory; disposing the dictionary discards it along with the heap.

use crate::error::{Result, StratumError};
use crate::heap::{Handle, HeapStats};
use crate::serial::SerializingCache;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

pub struct PersistentDictionary<K, V> {
    index: HashMap<K, Handle>,
    cache: SerializingCache<V>,
}

impl<K, V> PersistentDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(cache: SerializingCache<V>) -> Self {
        PersistentDictionary {
            index: HashMap::new(),
            cache,
        }
    }

    /// Store a new key. Fails with `DuplicateKey` when `key` is indexed.
    pub fn add(&mut self, key: K, value: &V) -> Result<()> {
        if self.index.contains_key(&key) {
            return Err(StratumError::DuplicateKey(format!("{key:?}")));
        }

        let handle = self.cache.create(value)?;
        self.index.insert(key, handle);
        Ok(())
    }

    /// Drop a key and its block. Returns whether the key was present.
    pub fn remove(&mut self, key: &K) -> Result<bool> {
        match self.index.remove(key) {
            Some(handle) => {
                self.cache.delete(handle)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn try_get(&mut self, key: &K) -> Result<Option<V>> {
        match self.index.get(key).copied() {
            Some(handle) => Ok(Some(self.cache.read(handle)?)),
            None => Ok(None),
        }
    }

    pub fn get(&mut self, key: &K) -> Result<V> {
        self.try_get(key)?
            .ok_or_else(|| StratumError::KeyNotFound(format!("{key:?}")))
    }

    /// Write through to the block, re-indexing when the update moved it.
    /// Absent keys are created.
    pub fn set(&mut self, key: &K, value: &V) -> Result<()> {
        match self.index.get(key).copied() {
            Some(handle) => {
                let fresh = self.cache.update(handle, value)?;
                if fresh != handle {
                    self.index.insert(key.clone(), fresh);
                }
            }
            None => {
                let handle = self.cache.create(value)?;
                self.index.insert(key.clone(), handle);
            }
        }
        Ok(())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Decode every entry from a snapshot of the index. Order is
    /// unspecified but stable for an unchanged dictionary.
    pub fn entries(&mut self) -> Result<Vec<(K, V)>> {
        let snapshot: Vec<(K, Handle)> = self
            .index
            .iter()
            .map(|(key, &handle)| (key.clone(), handle))
            .collect();

        let mut entries = Vec::with_capacity(snapshot.len());
        for (key, handle) in snapshot {
            entries.push((key, self.cache.read(handle)?));
        }
        Ok(entries)
    }

    /// Keys in index order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.index.keys()
    }

    /// Delete every block and drop the index.
    pub fn clear(&mut self) -> Result<()> {
        for (_, handle) in self.index.drain() {
            self.cache.delete(handle)?;
        }
        Ok(())
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.cache.heap_stats()
    }

    /// Release the cache, heap, and medium. Idempotent.
    pub fn dispose(&mut self) -> Result<()> {
        self.cache.dispose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Heap;
    use crate::serial::JsonCodec;

    fn dict(block_size: u64) -> PersistentDictionary<String, String> {
        PersistentDictionary::new(SerializingCache::new(
            Heap::in_memory(block_size),
            Box::new(JsonCodec::new()),
        ))
    }

    #[test]
    fn test_add_and_get() {
        let mut dict = dict(64);

        dict.add("a".to_string(), &"alpha".to_string()).unwrap();
        assert_eq!(dict.get(&"a".to_string()).unwrap(), "alpha");
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_duplicate_key() {
        let mut dict = dict(64);

        dict.add("a".to_string(), &"alpha".to_string()).unwrap();
        let result = dict.add("a".to_string(), &"again".to_string());
        assert!(matches!(result, Err(StratumError::DuplicateKey(_))));
    }

    #[test]
    fn test_remove() {
        let mut dict = dict(64);

        dict.add("a".to_string(), &"alpha".to_string()).unwrap();
        assert!(dict.remove(&"a".to_string()).unwrap());
        assert!(!dict.remove(&"a".to_string()).unwrap());
        assert!(dict.try_get(&"a".to_string()).unwrap().is_none());
        assert_eq!(dict.heap_stats().allocated_blocks, 0);
    }

    #[test]
    fn test_get_missing_key() {
        let mut dict = dict(64);
        assert!(matches!(
            dict.get(&"nope".to_string()),
            Err(StratumError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_set_creates_or_updates() {
        let mut dict = dict(64);

        dict.set(&"a".to_string(), &"alpha".to_string()).unwrap();
        assert_eq!(dict.get(&"a".to_string()).unwrap(), "alpha");

        dict.set(&"a".to_string(), &"a-much-longer-value".to_string())
            .unwrap();
        assert_eq!(dict.get(&"a".to_string()).unwrap(), "a-much-longer-value");
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_set_reindexes_moved_blocks() {
        // Tiny block size so a longer value forces a reallocation
        let mut dict = dict(4);

        dict.add("a".to_string(), &"ab".to_string()).unwrap();
        dict.set(&"a".to_string(), &"abcdefghij".to_string()).unwrap();
        dict.set(&"a".to_string(), &"xy".to_string()).unwrap();
        assert_eq!(dict.get(&"a".to_string()).unwrap(), "xy");
        assert_eq!(dict.heap_stats().allocated_blocks, 1);
    }

    #[test]
    fn test_entries_snapshot() {
        let mut dict = dict(64);

        for (key, value) in [("a", "1"), ("b", "2"), ("c", "3")] {
            dict.add(key.to_string(), &value.to_string()).unwrap();
        }

        let mut entries = dict.entries().unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_clear_frees_every_block() {
        let mut dict = dict(64);

        for i in 0..10 {
            dict.add(format!("k{i}"), &format!("v{i}")).unwrap();
        }
        dict.clear().unwrap();

        assert!(dict.is_empty());
        assert_eq!(dict.heap_stats().allocated_blocks, 0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut dict = dict(64);
        dict.add("a".to_string(), &"alpha".to_string()).unwrap();
        dict.dispose().unwrap();
        dict.dispose().unwrap();
    }
}
