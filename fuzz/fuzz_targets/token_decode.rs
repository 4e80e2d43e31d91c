//! Fuzzer for the full decode pipeline.
//!
//! Arbitrary text hits the facade the way a hostile cookie would. Decode
//! must reject without panicking, and a round-tripped token prefixed with
//! fuzz garbage must never be accepted.

#![no_main]

use std::sync::OnceLock;

use adamant_core::{Adamant, TokenValues};
use libfuzzer_sys::fuzz_target;
use url::Url;

fn service() -> &'static Adamant {
    static SERVICE: OnceLock<Adamant> = OnceLock::new();
    SERVICE.get_or_init(|| {
        let urls = [Url::parse("http://localhost/").unwrap()];
        Adamant::new(&urls, &[0xF0; 16], "", 0, false).expect("static configuration")
    })
}

fuzz_target!(|data: &[u8]| {
    let svc = service();

    if let Ok(text) = std::str::from_utf8(data) {
        // Arbitrary text: must never panic, and only the minimalist token
        // may decode without a round of AEAD.
        match svc.decode(text) {
            Ok(tv) => assert!(svc.is_minimalist(text) && tv == TokenValues::new()),
            Err(_) => {},
        }
    }

    // A genuine token mangled by a single fuzz byte must not survive.
    let mut tv = TokenValues::new();
    if !data.is_empty() && tv.set_u64(0, u64::from(data[0])).is_ok() {
        let token = svc.encode(&tv).expect("tiny record encodes");
        let mut mangled = token.into_bytes();
        let at = data.len() % mangled.len();
        if mangled[at] != data[0] {
            mangled[at] = data[0];
            if let Ok(mangled) = String::from_utf8(mangled) {
                assert!(svc.decode(&mangled).is_err(), "mangled token accepted");
            }
        }
    }
});
