//! Negative-space fuzzer for the wire decoder.
//!
//! Feeds arbitrary bytes straight into `unmarshal`, which in production only
//! ever sees AEAD-authenticated plaintext. The decoder must still hold up:
//! no panic, no allocation blow-up, and on success a record that re-encodes.

#![no_main]

use adamant_proto::{marshal, unmarshal};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(tv) = unmarshal(data) else {
        return;
    };

    // Anything the decoder accepts must be re-encodable: the decoder
    // enforces stricter bounds (<=31 values, <=255 bytes each) than the
    // encoder needs.
    let mut rng = rand::rngs::mock::StepRng::new(0, 1);
    let buf = marshal(&tv, data[0], &mut rng).expect("decoded record re-encodes");

    // And the re-encode parses back to the same record: decoded expiries
    // are already truncated to the wire precision, so they survive exactly.
    let again = unmarshal(&buf).expect("re-encoded buffer parses");
    assert_eq!(again.expires, tv.expires);
    assert_eq!(again.address, tv.address);
    assert_eq!(again.values, tv.values);
});
