//! Stratum: a two-tier caching dictionary
//!
//! A bounded set of recently-used entries stays in memory; colder entries
//! spill transparently to a byte-addressable backing store. The storage
//! core is a handle-based byte heap with a best-fit free-list allocator,
//! a serializing cache layered over it, and a promotion/demotion engine
//! between the two tiers.
//!
//! ## Features
//!
//! - **Best-fit allocation** with block splitting and free-list coalescing
//! - **Opaque handles**: blocks are addressed by identity, not offset
//! - **Pluggable media**: the same heap runs over an in-memory buffer or a
//!   temporary file
//! - **Pluggable codecs**: values are serialized by an embedder-chosen
//!   [`Codec`]; [`JsonCodec`] works out of the box for serde types
//! - **LRU tiering**: persistent hits are promoted, local evictions are
//!   demoted, and a key lives in exactly one tier
//!
//! ## Modules
//!
//! - [`error`] - Error types for every layer
//! - [`medium`] - Backing-medium capability and its two implementations
//! - [`heap`] - Handle-based byte heap and its free-list manager
//! - [`serial`] - Codecs and the serializing cache
//! - [`ring`] - Fixed-capacity circular buffer (the recency queue)
//! - [`local`] - Bounded in-memory tier with LRU eviction
//! - [`persistent`] - Key-to-handle dictionary over the heap
//! - [`tiered`] - The two-tier dictionary façade and its builder
//! - [`sync`] - Coarse one-lock adapter for shared use
//!
//! ## Example
//!
//! ```
//! use stratum::{CachingDictionary, JsonCodec, Result};
//!
//! fn main() -> Result<()> {
//!     let mut dict: CachingDictionary<String, u64> =
//!         CachingDictionary::builder(JsonCodec::new())
//!             .local_capacity(2)
//!             .in_memory();
//!
//!     dict.add("a".to_string(), 1)?;
//!     dict.add("b".to_string(), 2)?;
//!     dict.add("c".to_string(), 3)?; // "a" is demoted to the heap
//!
//!     assert_eq!(dict.get(&"a".to_string())?, 1); // promoted back
//!     assert_eq!(dict.len(), 3);
//!
//!     dict.dispose()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! CachingDictionary ── local tier ──> LocalCache ──> CircularBuffer
//!        │                                              (recency)
//!        └── persistent tier ──> PersistentDictionary
//!                                       │
//!                                SerializingCache ── Codec
//!                                       │
//!                                     Heap ── HeapManager (free list)
//!                                       │
//!                                    Medium (memory | temp file)
//! ```
//!
//! The backing file is scratch space: there is no on-disk format, the
//! in-memory index is authoritative, and the file is deleted on dispose.
//! Durability, crash consistency, and multi-writer access are non-goals.

pub mod error;
pub mod heap;
pub mod local;
pub mod medium;
pub mod persistent;
pub mod ring;
pub mod serial;
pub mod sync;
pub mod tiered;

pub use error::{Result, StratumError};
pub use heap::{Block, Handle, Heap, HeapManager, HeapStats, DEFAULT_BLOCK_SIZE};
pub use local::{LocalCache, LocalCacheStats};
pub use medium::{FileMedium, Medium, MemoryMedium};
pub use persistent::PersistentDictionary;
pub use ring::CircularBuffer;
pub use serial::{Codec, FnCodec, JsonCodec, SerializingCache};
pub use sync::SharedDictionary;
pub use tiered::{Builder, CachingDictionary, TierStats};
