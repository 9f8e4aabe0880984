//! Two-tier caching dictionary façade
//!
//! Composes a [`LocalCache`] (tier L, bounded, in-memory) with a
//! [`PersistentDictionary`] (tier P, unbounded, heap-backed) behind one
//! dictionary surface. A key lives in exactly one tier. Reads that hit P
//! promote the key into L; insertions and promotions that overflow L demote
//! its oldest key back into P. Nothing moves in the background.

use crate::error::{Result, StratumError};
use crate::heap::{Heap, HeapStats, DEFAULT_BLOCK_SIZE};
use crate::local::{LocalCache, LocalCacheStats};
use crate::medium::Medium;
use crate::persistent::PersistentDictionary;
use crate::serial::{Codec, SerializingCache};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

const DEFAULT_LOCAL_CAPACITY: usize = 16;

/// Counters and sizes across both tiers.
#[derive(Debug, Clone, Copy)]
pub struct TierStats {
    pub local: LocalCacheStats,
    pub persistent_entries: usize,
    pub promotions: u64,
    pub demotions: u64,
}

/// Two-tier dictionary: hot keys in memory, cold keys on the heap.
pub struct CachingDictionary<K, V> {
    local: LocalCache<K, V>,
    persistent: PersistentDictionary<K, V>,
    promotions: u64,
    demotions: u64,
}

impl<K, V> CachingDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Start building a dictionary around the given value codec.
    pub fn builder(codec: impl Codec<V> + 'static) -> Builder<K, V> {
        Builder {
            codec: Box::new(codec),
            block_size: DEFAULT_BLOCK_SIZE,
            local_capacity: DEFAULT_LOCAL_CAPACITY,
            _keys: PhantomData,
        }
    }

    fn assemble(local_capacity: usize, cache: SerializingCache<V>) -> Self {
        CachingDictionary {
            local: LocalCache::new(local_capacity),
            persistent: PersistentDictionary::new(cache),
            promotions: 0,
            demotions: 0,
        }
    }

    /// Insert a new key into the local tier, demoting L's oldest entry when
    /// the tier is full. Fails with `DuplicateKey` when the key is present
    /// in either tier.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        if self.contains(&key) {
            return Err(StratumError::DuplicateKey(format!("{key:?}")));
        }

        if let Some((old_key, old_value)) = self.local.add_or_overwrite(key, value) {
            self.demote(old_key, old_value)?;
        }
        Ok(())
    }

    fn demote(&mut self, key: K, value: V) -> Result<()> {
        tracing::debug!("demoting {:?} to the persistent tier", key);
        self.demotions += 1;
        self.persistent.add(key, &value)
    }

    /// Pull a key out of P into L, demoting L's oldest entry if needed.
    fn make_local(&mut self, key: K, value: V) -> Result<()> {
        tracing::debug!("promoting {:?} to the local tier", key);
        self.persistent.remove(&key)?;
        self.promotions += 1;

        if let Some((old_key, old_value)) = self.local.add_or_overwrite(key, value) {
            self.demote(old_key, old_value)?;
        }
        Ok(())
    }

    /// Look up a key in either tier. A persistent hit promotes the key.
    pub fn try_get(&mut self, key: &K) -> Result<Option<V>> {
        if let Some(value) = self.local.try_get(key) {
            return Ok(Some(value));
        }

        let Some(value) = self.persistent.try_get(key)? else {
            return Ok(None);
        };
        self.make_local(key.clone(), value.clone())?;
        Ok(Some(value))
    }

    pub fn get(&mut self, key: &K) -> Result<V> {
        self.try_get(key)?
            .ok_or_else(|| StratumError::KeyNotFound(format!("{key:?}")))
    }

    /// Write a value under a key, inserting it if absent. A key found in P
    /// is promoted with the new value in one step.
    pub fn set(&mut self, key: &K, value: V) -> Result<()> {
        if self.local.contains(key) {
            return self.local.set(key, value);
        }
        if !self.persistent.contains(key) {
            return self.add(key.clone(), value);
        }
        self.make_local(key.clone(), value)
    }

    /// Remove a key from whichever tier holds it.
    pub fn remove(&mut self, key: &K) -> Result<bool> {
        if self.local.remove(key) {
            return Ok(true);
        }
        self.persistent.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.local.contains(key) || self.persistent.contains(key)
    }

    pub fn len(&self) -> usize {
        self.local.len() + self.persistent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry, local tier first. No promotion happens.
    pub fn entries(&mut self) -> Result<Vec<(K, V)>> {
        let mut entries: Vec<(K, V)> = self
            .local
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        entries.extend(self.persistent.entries()?);
        Ok(entries)
    }

    /// Drop every entry in both tiers.
    pub fn clear(&mut self) -> Result<()> {
        self.local.clear();
        self.persistent.clear()
    }

    pub fn stats(&self) -> TierStats {
        TierStats {
            local: self.local.stats(),
            persistent_entries: self.persistent.len(),
            promotions: self.promotions,
            demotions: self.demotions,
        }
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.persistent.heap_stats()
    }

    /// Release the persistent tier, its heap, and the backing medium.
    /// Idempotent.
    pub fn dispose(&mut self) -> Result<()> {
        self.persistent.dispose()
    }
}

/// Fluent construction for [`CachingDictionary`].
///
/// ```
/// use stratum::{CachingDictionary, JsonCodec};
///
/// let dict: CachingDictionary<String, u64> =
///     CachingDictionary::builder(JsonCodec::new())
///         .block_size(4096)
///         .local_capacity(64)
///         .in_memory();
/// # let _ = dict;
/// ```
pub struct Builder<K, V> {
    codec: Box<dyn Codec<V>>,
    block_size: u64,
    local_capacity: usize,
    _keys: PhantomData<fn() -> K>,
}

impl<K, V> Builder<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Growth quantum of the backing heap in bytes.
    pub fn block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size;
        self
    }

    /// Number of entries the in-memory tier holds.
    pub fn local_capacity(mut self, capacity: usize) -> Self {
        self.local_capacity = capacity;
        self
    }

    /// Back the heap with an in-memory buffer.
    pub fn in_memory(self) -> CachingDictionary<K, V> {
        let heap = Heap::in_memory(self.block_size);
        CachingDictionary::assemble(
            self.local_capacity,
            SerializingCache::new(heap, self.codec),
        )
    }

    /// Back the heap with a temporary file, deleted on dispose.
    pub fn temp_file(self) -> Result<CachingDictionary<K, V>> {
        let heap = Heap::temp_file(self.block_size)?;
        Ok(CachingDictionary::assemble(
            self.local_capacity,
            SerializingCache::new(heap, self.codec),
        ))
    }

    /// Back the heap with a caller-supplied medium, owned and closed by the
    /// dictionary.
    pub fn medium(self, medium: Box<dyn Medium>) -> CachingDictionary<K, V> {
        let heap = Heap::with_medium(medium, self.block_size);
        CachingDictionary::assemble(
            self.local_capacity,
            SerializingCache::new(heap, self.codec),
        )
    }
}
