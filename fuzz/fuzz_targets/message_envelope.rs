#![no_main]

use libfuzzer_sys::fuzz_target;
use rumor_wire::{decode_message, encode_message};

// Any payload the decoder accepts must survive a re-encode cycle with
// every field intact, including the derived acknowledgment flag.
fuzz_target!(|data: &[u8]| {
    if let Ok(message) = decode_message(data) {
        let encoded = encode_message(&message);
        let again = decode_message(&encoded).expect("re-encoded message must parse");
        assert_eq!(again, message);
    }
});
