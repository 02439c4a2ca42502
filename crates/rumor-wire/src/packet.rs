//! Binary packet framing
//!
//! Every frame is a 16-byte header followed by the raw payload:
//! - Bytes 0-3: Magic (BE, ASCII "TELE")
//! - Bytes 4-7: Payload length (BE)
//! - Bytes 8-11: Sequence number (BE)
//! - Bytes 12-15: CRC-32 of the payload (BE)

use rumor_core::{RumorError, RumorResult};

/// Frame start marker, ASCII "TELE"
pub const PACKET_MAGIC: u32 = 0x5445_4C45;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Default ceiling on a declared payload length
pub const MAX_PAYLOAD: usize = 1_000_000;

/// A framed packet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Frame start marker; always `PACKET_MAGIC` on valid packets
    pub magic: u32,
    /// Payload length in bytes
    pub length: u32,
    /// Per-link sequence number
    pub sequence: u32,
    /// CRC-32 of the payload
    pub checksum: u32,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

impl Packet {
    /// Frame a payload; magic, length, and checksum are derived
    pub fn new(payload: Vec<u8>, sequence: u32) -> Self {
        let checksum = crc32fast::hash(&payload);
        Packet {
            magic: PACKET_MAGIC,
            length: payload.len() as u32,
            sequence,
            checksum,
            payload,
        }
    }

    /// Serialize to header + payload bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.extend_from_slice(&self.magic.to_be_bytes());
        buf.extend_from_slice(&self.length.to_be_bytes());
        buf.extend_from_slice(&self.sequence.to_be_bytes());
        buf.extend_from_slice(&self.checksum.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Strict one-shot decode of a complete frame
    ///
    /// The buffer must hold exactly one packet: the header, then exactly
    /// `length` payload bytes, nothing trailing.
    pub fn decode(buf: &[u8]) -> RumorResult<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(RumorError::BufferTooShort {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let magic = u32::from_be_bytes(buf[0..4].try_into().unwrap());
        if magic != PACKET_MAGIC {
            return Err(RumorError::BadMagic(magic));
        }

        let length = u32::from_be_bytes(buf[4..8].try_into().unwrap());
        let sequence = u32::from_be_bytes(buf[8..12].try_into().unwrap());
        let checksum = u32::from_be_bytes(buf[12..16].try_into().unwrap());

        if buf.len() != HEADER_SIZE + length as usize {
            return Err(RumorError::LengthMismatch {
                declared: length as usize,
                actual: buf.len() - HEADER_SIZE,
            });
        }

        let payload = buf[HEADER_SIZE..].to_vec();
        let computed = crc32fast::hash(&payload);
        if computed != checksum {
            return Err(RumorError::ChecksumMismatch { computed, expected: checksum });
        }

        Ok(Packet {
            magic,
            length,
            sequence,
            checksum,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_roundtrip() {
        let packet = Packet::new(b"a meme travels the mesh".to_vec(), 42);
        let bytes = packet.encode();
        assert_eq!(bytes.len(), HEADER_SIZE + packet.payload.len());

        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let packet = Packet::new(Vec::new(), 0);
        let decoded = Packet::decode(&packet.encode()).unwrap();
        assert_eq!(decoded.length, 0);
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_decode_too_short() {
        let result = Packet::decode(&[0u8; 15]);
        assert!(matches!(result, Err(RumorError::BufferTooShort { .. })));
    }

    #[test]
    fn test_decode_wrong_magic() {
        let mut bytes = Packet::new(b"x".to_vec(), 1).encode();
        bytes[0] = 0xFF;
        let result = Packet::decode(&bytes);
        assert!(matches!(result, Err(RumorError::BadMagic(_))));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut bytes = Packet::new(b"abcdef".to_vec(), 1).encode();
        bytes.truncate(bytes.len() - 2);
        let result = Packet::decode(&bytes);
        assert!(matches!(result, Err(RumorError::LengthMismatch { .. })));
    }

    #[test]
    fn test_decode_corrupted_payload() {
        let mut bytes = Packet::new(b"pristine bytes".to_vec(), 1).encode();
        bytes[HEADER_SIZE + 3] ^= 0x20;
        let result = Packet::decode(&bytes);
        assert!(matches!(result, Err(RumorError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_magic_spells_tele() {
        assert_eq!(&PACKET_MAGIC.to_be_bytes(), b"TELE");
    }
}
