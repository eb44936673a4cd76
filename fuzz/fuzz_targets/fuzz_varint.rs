#![no_main]

use libfuzzer_sys::fuzz_target;
use storedcounter::varint::{decode_uvarint, encode_uvarint};

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, only return errors for invalid input
    if let Ok((value, used)) = decode_uvarint(data) {
        assert!(used >= 1 && used <= data.len());
        // A zero final byte means zero-padded input, which re-encodes shorter
        if used == 1 || data[used - 1] != 0 {
            assert_eq!(encode_uvarint(value), &data[..used]);
        }
    }
});
