//! Typed values over raw heap bytes
//!
//! A [`Codec`] turns values into byte arrays and back; the
//! [`SerializingCache`] pairs a codec with a [`Heap`] so callers work in
//! handles and values instead of offsets and buffers. Blocks are sized by
//! the allocator, never by sniffing the payload, so codecs need not be
//! self-describing.

use crate::error::Result;
use crate::heap::{Handle, Heap, HeapStats};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Encoder/decoder pair chosen by the embedder. Codecs are `Send` so a
/// dictionary can sit behind the shared-dictionary lock.
pub trait Codec<T>: Send {
    fn encode(&self, value: &T) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON codec for any serde-serializable value type.
pub struct JsonCodec<T> {
    _values: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        JsonCodec {
            _values: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        JsonCodec::new()
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec<T> {
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Codec from a plain pair of functions.
pub struct FnCodec<T> {
    encode: fn(&T) -> Vec<u8>,
    decode: fn(&[u8]) -> T,
}

impl<T> FnCodec<T> {
    pub fn new(encode: fn(&T) -> Vec<u8>, decode: fn(&[u8]) -> T) -> Self {
        FnCodec { encode, decode }
    }
}

impl<T> Codec<T> for FnCodec<T> {
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        Ok((self.encode)(value))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        Ok((self.decode)(bytes))
    }
}

/// CRUD over typed values stored as heap blocks.
pub struct SerializingCache<T> {
    heap: Heap,
    codec: Box<dyn Codec<T>>,
}

impl<T> SerializingCache<T> {
    pub fn new(heap: Heap, codec: Box<dyn Codec<T>>) -> Self {
        SerializingCache { heap, codec }
    }

    /// Serialize `value` into a freshly allocated block.
    pub fn create(&mut self, value: &T) -> Result<Handle> {
        let bytes = self.codec.encode(value)?;
        let handle = self.heap.allocate(bytes.len() as u64)?;
        self.heap.write(handle, &bytes)?;
        Ok(handle)
    }

    /// Deserialize the value stored under `handle`.
    pub fn read(&mut self, handle: Handle) -> Result<T> {
        let bytes = self.heap.read(handle)?;
        self.codec.decode(&bytes)
    }

    /// Replace the value under `handle`. When the new encoding has the same
    /// length the block is rewritten in place; otherwise the block is
    /// reallocated and the returned handle differs. Callers must treat the
    /// handle as potentially changed.
    pub fn update(&mut self, handle: Handle, value: &T) -> Result<Handle> {
        let bytes = self.codec.encode(value)?;
        let block = self.heap.manager().get_allocated_block(handle)?;

        if bytes.len() as u64 == block.length() {
            self.heap.write(handle, &bytes)?;
            return Ok(handle);
        }

        self.heap.free(handle)?;
        let fresh = self.heap.allocate(bytes.len() as u64)?;
        self.heap.write(fresh, &bytes)?;
        Ok(fresh)
    }

    /// Release the block under `handle`.
    pub fn delete(&mut self, handle: Handle) -> Result<()> {
        self.heap.free(handle)
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Release the heap and its medium. Idempotent.
    pub fn dispose(&mut self) -> Result<()> {
        self.heap.dispose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_cache(block_size: u64) -> SerializingCache<String> {
        SerializingCache::new(
            Heap::in_memory(block_size),
            Box::new(FnCodec::new(
                |s: &String| s.as_bytes().to_vec(),
                |b: &[u8]| String::from_utf8_lossy(b).into_owned(),
            )),
        )
    }

    #[test]
    fn test_create_and_read() {
        let mut cache = string_cache(64);

        let handle = cache.create(&"hello".to_string()).unwrap();
        assert_eq!(cache.read(handle).unwrap(), "hello");
    }

    #[test]
    fn test_update_same_length_keeps_handle() {
        let mut cache = string_cache(64);

        let handle = cache.create(&"aaaa".to_string()).unwrap();
        let updated = cache.update(handle, &"bbbb".to_string()).unwrap();

        assert_eq!(updated, handle);
        assert_eq!(cache.read(updated).unwrap(), "bbbb");
    }

    #[test]
    fn test_update_with_size_change_moves_value() {
        let mut cache = string_cache(4);

        let h1 = cache.create(&"ab".to_string()).unwrap();
        let h2 = cache.update(h1, &"abcdef".to_string()).unwrap();

        assert_ne!(h1, h2);
        assert_eq!(cache.read(h2).unwrap(), "abcdef");

        // The region behind h1 is free again
        assert!(cache.read(h1).is_err());
        let h3 = cache.create(&"xy".to_string()).unwrap();
        assert_eq!(cache.read(h3).unwrap(), "xy");
    }

    #[test]
    fn test_delete_releases_block() {
        let mut cache = string_cache(64);

        let handle = cache.create(&"data".to_string()).unwrap();
        cache.delete(handle).unwrap();
        assert!(cache.read(handle).is_err());
        assert_eq!(cache.heap_stats().allocated_blocks, 0);
    }

    #[test]
    fn test_json_codec_roundtrip() {
        let mut cache: SerializingCache<Vec<u32>> = SerializingCache::new(
            Heap::in_memory(64),
            Box::new(JsonCodec::new()),
        );

        let handle = cache.create(&vec![1, 2, 3]).unwrap();
        assert_eq!(cache.read(handle).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_value() {
        let mut cache = string_cache(64);

        let handle = cache.create(&String::new()).unwrap();
        assert_eq!(cache.read(handle).unwrap(), "");
        cache.delete(handle).unwrap();
    }

    #[test]
    fn test_dispose_propagates() {
        let mut cache = string_cache(64);
        cache.create(&"x".to_string()).unwrap();
        cache.dispose().unwrap();
        cache.dispose().unwrap();
    }
}
