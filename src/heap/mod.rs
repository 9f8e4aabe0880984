//! Handle-based byte heap over a backing medium
//!
//! [`HeapManager`] owns the free-list bookkeeping; [`Heap`] binds a manager
//! to a [`Medium`] and performs the actual reads and writes. The heap keeps
//! the medium's length in lockstep with the manager's address space and
//! never caches or reorders I/O.

pub mod manager;

pub use manager::{Block, Handle, HeapManager, HeapStats, DEFAULT_BLOCK_SIZE};

use crate::error::{Result, StratumError};
use crate::medium::{FileMedium, Medium, MemoryMedium};

/// Byte heap: allocate a handle, write exactly the block's length, read it
/// back, free it.
///
/// The heap either owns its medium (created it, closes it on dispose) or
/// borrows it (caller created it, caller closes it). The decision is fixed
/// at construction.
pub struct Heap {
    manager: HeapManager,
    medium: Box<dyn Medium>,
    owns_medium: bool,
    disposed: bool,
}

impl Heap {
    /// Heap over a fresh in-memory buffer.
    pub fn in_memory(block_size: u64) -> Self {
        Heap::with_medium(Box::new(MemoryMedium::new()), block_size)
    }

    /// Heap over a fresh temporary file, deleted on dispose.
    pub fn temp_file(block_size: u64) -> Result<Self> {
        Ok(Heap::with_medium(Box::new(FileMedium::temp()?), block_size))
    }

    /// Heap that owns `medium` and closes it on dispose.
    pub fn with_medium(medium: Box<dyn Medium>, block_size: u64) -> Self {
        Heap {
            manager: HeapManager::new(block_size),
            medium,
            owns_medium: true,
            disposed: false,
        }
    }

    /// Heap over a caller-managed medium; dispose leaves the medium open.
    pub fn with_borrowed_medium(medium: Box<dyn Medium>, block_size: u64) -> Self {
        Heap {
            manager: HeapManager::new(block_size),
            medium,
            owns_medium: false,
            disposed: false,
        }
    }

    /// Allocate `length` bytes, extending the medium first when the address
    /// space grows.
    pub fn allocate(&mut self, length: u64) -> Result<Handle> {
        let handle = self.manager.allocate(length)?;

        let heap_length = self.manager.heap_length();
        if self.medium.length()? < heap_length {
            self.medium.set_length(heap_length)?;
        }

        Ok(handle)
    }

    /// Read the full contents of an allocated block.
    pub fn read(&mut self, handle: Handle) -> Result<Vec<u8>> {
        let block = self.manager.get_allocated_block(handle)?;
        let mut buf = vec![0u8; block.length() as usize];
        if buf.is_empty() {
            return Ok(buf);
        }

        self.medium.set_position(block.offset())?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.medium.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(StratumError::UnexpectedEndOfStream {
                    offset: block.offset(),
                    requested: block.length(),
                    read: filled as u64,
                });
            }
            filled += n;
        }

        Ok(buf)
    }

    /// Write `bytes` to an allocated block. The buffer must match the block
    /// length exactly.
    pub fn write(&mut self, handle: Handle, bytes: &[u8]) -> Result<()> {
        let block = self.manager.get_allocated_block(handle)?;
        if bytes.len() as u64 != block.length() {
            return Err(StratumError::LengthMismatch {
                handle: handle.value(),
                expected: block.length(),
                actual: bytes.len() as u64,
            });
        }
        if bytes.is_empty() {
            return Ok(());
        }

        self.medium.set_position(block.offset())?;
        self.medium.write(bytes)
    }

    /// Release an allocated block.
    pub fn free(&mut self, handle: Handle) -> Result<()> {
        self.manager.free(handle)
    }

    /// The free-list bookkeeping behind this heap.
    pub fn manager(&self) -> &HeapManager {
        &self.manager
    }

    pub fn stats(&self) -> HeapStats {
        self.manager.stats()
    }

    /// Close the medium if this heap owns it. Idempotent.
    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;

        if self.owns_medium {
            self.medium.close()
        } else {
            Ok(())
        }
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        let _ = self.dispose();
    }
}
