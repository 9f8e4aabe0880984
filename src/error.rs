use thiserror::Error;

#[derive(Error, Debug)]
pub enum StratumError {
    #[error("Invalid handle: {0}")]
    InvalidHandle(u64),

    #[error("Free block too small: {available} bytes available, {requested} requested")]
    BlockTooSmall { available: u64, requested: u64 },

    #[error("Heap address space exhausted")]
    OutOfAddressSpace,

    #[error("Length mismatch for handle {handle}: block holds {expected} bytes, buffer has {actual}")]
    LengthMismatch {
        handle: u64,
        expected: u64,
        actual: u64,
    },

    #[error("Unexpected end of stream at offset {offset}: requested {requested} bytes, read {read}")]
    UnexpectedEndOfStream {
        offset: u64,
        requested: u64,
        read: u64,
    },

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Buffer is empty")]
    Empty,

    #[error("Index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("Buffer has zero capacity")]
    ZeroCapacity,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StratumError>;
