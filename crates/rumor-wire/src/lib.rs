//! Rumor Wire Protocol - Binary packet framing and the text envelope
//!
//! This crate implements the rumor wire format:
//! - Fixed 16-byte header: big-endian magic, length, sequence, CRC-32
//! - Payload checksum validation
//! - Stream resynchronization after corruption or misalignment
//! - The 7-field `|`-delimited message envelope

pub mod envelope;
pub mod packet;
pub mod stream;

pub use envelope::*;
pub use packet::*;
pub use stream::*;
