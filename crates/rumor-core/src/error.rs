//! Error types for the rumor protocol

use thiserror::Error;

/// Core rumor errors
#[derive(Error, Debug)]
pub enum RumorError {
    // Format errors
    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Frame length mismatch: header declares {declared}, buffer carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    // Protocol errors
    #[error("Bad magic: 0x{0:08X}")]
    BadMagic(u32),

    #[error("Payload too large: {length} exceeds maximum {max}")]
    PayloadTooLarge { length: usize, max: usize },

    // Integrity errors
    #[error("Checksum mismatch: computed 0x{computed:08X}, header says 0x{expected:08X}")]
    ChecksumMismatch { computed: u32, expected: u32 },

    // Parse errors
    #[error("Message field count: expected {expected}, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("Message field {field} is not numeric: {value:?}")]
    BadNumber { field: &'static str, value: String },

    #[error("Message payload is not valid UTF-8")]
    BadText(#[from] std::str::Utf8Error),

    // Connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),

    // Key material errors
    #[error("Key storage: {0}")]
    KeyStorage(String),
}

/// Result type for rumor operations
pub type RumorResult<T> = Result<T, RumorError>;
