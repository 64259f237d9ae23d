#![no_main]

use libfuzzer_sys::fuzz_target;
use streamhouse_client::envelope;

fuzz_target!(|data: &[u8]| {
    // Fuzz message frame decoding; malformed frames must be errors, not panics
    if let Ok(message) = envelope::decode(data) {
        let frame = envelope::encode(&message).unwrap();
        assert_eq!(envelope::decode(&frame).unwrap(), message);
    }
});
