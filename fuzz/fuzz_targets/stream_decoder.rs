#![no_main]

use libfuzzer_sys::fuzz_target;
use rumor_wire::StreamDecoder;

// Arbitrary bytes must never panic the decoder, and draining must
// terminate: every error consumes a corrupt frame, every resync step
// consumes a byte.
fuzz_target!(|data: &[u8]| {
    let mut decoder = StreamDecoder::new();
    decoder.feed(data);

    loop {
        match decoder.next_packet() {
            Ok(Some(packet)) => {
                assert_eq!(packet.length as usize, packet.payload.len());
            }
            Ok(None) => break,
            Err(_) => {}
        }
    }

    assert!(decoder.buffered() <= data.len());
});
