#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use streamhouse_schema::keyvalue;

fuzz_target!(|data: &[u8]| {
    // Fuzz composite key/value schema decoding.
    // Tests handling of:
    // - Truncated length fields
    // - Lengths past the end of the input
    // - Negative lengths other than -1
    // - Trailing bytes
    let input = Bytes::copy_from_slice(data);
    let Ok(parts) = keyvalue::decode(&input) else {
        return;
    };

    // Anything that decodes survives a re-encode
    let encoded = keyvalue::encode_definitions(parts.key(), parts.value()).unwrap();
    assert_eq!(encoded.len(), keyvalue::HEADER_LEN + parts.key().len() + parts.value().len());

    let again = keyvalue::decode(&encoded).unwrap();
    assert_eq!(again.key(), parts.key());
    assert_eq!(again.value(), parts.value());
});
