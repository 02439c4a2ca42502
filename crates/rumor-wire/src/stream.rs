//! Inbound stream decoder with resynchronization
//!
//! Read side of the framing state machine: `ReadHeader -> ReadPayload ->
//! ReadHeader`, with a `Resync` detour whenever the front of the buffer
//! does not look like a frame (wrong magic, or a declared length past the
//! ceiling). Resync slides the window one byte at a time until the magic
//! lines up again. There is no bound on how far it scans: a corrupt-heavy
//! stream costs CPU, it never kills the link.

use bytes::{Buf, BytesMut};

use rumor_core::RumorResult;

use crate::packet::{Packet, HEADER_SIZE, MAX_PAYLOAD, PACKET_MAGIC};

/// Incremental packet decoder for one byte stream
#[derive(Debug)]
pub struct StreamDecoder {
    buf: BytesMut,
    max_payload: usize,
    skipped: u64,
}

impl StreamDecoder {
    pub fn new() -> Self {
        StreamDecoder::with_max_payload(MAX_PAYLOAD)
    }

    /// Decoder with a custom payload ceiling
    pub fn with_max_payload(max_payload: usize) -> Self {
        StreamDecoder {
            buf: BytesMut::with_capacity(4096),
            max_payload,
            skipped: 0,
        }
    }

    /// Append raw bytes read from the stream
    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Total bytes discarded while hunting for a frame boundary
    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Bytes currently buffered
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Try to extract the next packet
    ///
    /// `Ok(None)` means more bytes are needed. `Err` reports a complete
    /// frame whose payload failed validation; that frame has been
    /// consumed, and the next call resumes at the following boundary.
    pub fn next_packet(&mut self) -> RumorResult<Option<Packet>> {
        loop {
            if self.buf.len() < HEADER_SIZE {
                return Ok(None);
            }

            let magic = u32::from_be_bytes(self.buf[0..4].try_into().unwrap());
            let length = u32::from_be_bytes(self.buf[4..8].try_into().unwrap()) as usize;

            if magic != PACKET_MAGIC || length > self.max_payload {
                // Resync: discard one byte, retest at the new alignment.
                self.buf.advance(1);
                self.skipped += 1;
                continue;
            }

            let frame_len = HEADER_SIZE + length;
            if self.buf.len() < frame_len {
                return Ok(None);
            }

            let frame = self.buf.split_to(frame_len);
            // A checksum failure consumes the whole frame: the boundary
            // was sound, the bytes were not.
            return Packet::decode(&frame).map(Some);
        }
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        StreamDecoder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumor_core::RumorError;

    fn framed(payload: &[u8], sequence: u32) -> Vec<u8> {
        Packet::new(payload.to_vec(), sequence).encode()
    }

    #[test]
    fn test_clean_single_packet() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(&framed(b"hello", 1));
        let packet = decoder.next_packet().unwrap().unwrap();
        assert_eq!(packet.payload, b"hello");
        assert_eq!(decoder.skipped(), 0);
        assert!(decoder.next_packet().unwrap().is_none());
    }

    #[test]
    fn test_drip_fed_bytes() {
        let mut decoder = StreamDecoder::new();
        let bytes = framed(b"one byte at a time", 7);
        for (i, b) in bytes.iter().enumerate() {
            decoder.feed(&[*b]);
            let got = decoder.next_packet().unwrap();
            if i + 1 < bytes.len() {
                assert!(got.is_none());
            } else {
                assert_eq!(got.unwrap().payload, b"one byte at a time");
            }
        }
    }

    #[test]
    fn test_two_packets_one_feed() {
        let mut decoder = StreamDecoder::new();
        let mut bytes = framed(b"first", 1);
        bytes.extend_from_slice(&framed(b"second", 2));
        decoder.feed(&bytes);
        assert_eq!(decoder.next_packet().unwrap().unwrap().payload, b"first");
        assert_eq!(decoder.next_packet().unwrap().unwrap().payload, b"second");
        assert!(decoder.next_packet().unwrap().is_none());
    }

    #[test]
    fn test_resync_over_garbage_prefix() {
        // The core recovery property: N garbage bytes ahead of a valid
        // frame never cost us the frame.
        for n in 1..=20usize {
            let mut decoder = StreamDecoder::new();
            let mut bytes = vec![0xAA; n];
            bytes.extend_from_slice(&framed(b"survivor", 3));
            decoder.feed(&bytes);
            let packet = decoder.next_packet().unwrap().unwrap();
            assert_eq!(packet.payload, b"survivor");
            assert_eq!(decoder.skipped(), n as u64);
        }
    }

    #[test]
    fn test_resync_over_partial_magic() {
        let mut decoder = StreamDecoder::new();
        let mut bytes = b"TEL".to_vec();
        bytes.extend_from_slice(&framed(b"aligned", 4));
        decoder.feed(&bytes);
        assert_eq!(decoder.next_packet().unwrap().unwrap().payload, b"aligned");
        assert_eq!(decoder.skipped(), 3);
    }

    #[test]
    fn test_resync_over_oversize_length() {
        let mut decoder = StreamDecoder::with_max_payload(64);
        // Valid magic but an absurd declared length: treated as noise.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&PACKET_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&1_000u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&framed(b"small enough", 5));
        decoder.feed(&bytes);
        let packet = decoder.next_packet().unwrap().unwrap();
        assert_eq!(packet.payload, b"small enough");
        assert!(decoder.skipped() >= 1);
    }

    #[test]
    fn test_corrupt_frame_consumed_stream_survives() {
        let mut decoder = StreamDecoder::new();
        let mut bad = framed(b"soon corrupt", 6);
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        bad.extend_from_slice(&framed(b"still here", 7));
        decoder.feed(&bad);

        let err = decoder.next_packet().unwrap_err();
        assert!(matches!(err, RumorError::ChecksumMismatch { .. }));
        assert_eq!(decoder.next_packet().unwrap().unwrap().payload, b"still here");
    }

    #[test]
    fn test_resync_counter_accumulates() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(&[0x00; 5]);
        decoder.feed(&framed(b"a", 8));
        decoder.next_packet().unwrap().unwrap();
        decoder.feed(&[0x00; 4]);
        decoder.feed(&framed(b"b", 9));
        decoder.next_packet().unwrap().unwrap();
        assert_eq!(decoder.skipped(), 9);
    }
}
