//! End-to-end scenarios over the full encode/decode pipeline.
//!
//! Each test drives the facade the way middleware would: build a service,
//! seal a record, ship the text through a cookie or header, open it again.

use std::net::IpAddr;

use adamant_core::{
    Adamant, KeyVal, TokenError, TokenValues, MIN_TOKEN_LEN, TOKEN_SCHEME,
};
use proptest::prelude::*;
use url::Url;

const EXPIRY_2030: i64 = 1_893_456_000; // 2030-01-01T00:00:00Z

fn localhost() -> Vec<Url> {
    vec![Url::parse("http://localhost/").unwrap()]
}

fn service_with_key(key: &[u8]) -> Adamant {
    Adamant::new(&localhost(), key, "", 0, false).unwrap()
}

fn service() -> Adamant {
    service_with_key(&[0x5E; 16])
}

#[test]
fn minimalist_token() {
    let svc = service();

    let token = svc.encode(&TokenValues::new()).unwrap();
    assert_eq!(token.len(), MIN_TOKEN_LEN);

    let tv = svc.decode(&token).unwrap();
    assert_eq!(tv, TokenValues::new());

    // The equality fast path triggers for the precomputed token and the
    // cookie hands it out preformed.
    assert!(svc.is_minimalist(svc.minimalist()));
    assert_eq!(svc.cookie().value(), format!("{TOKEN_SCHEME}{}", svc.minimalist()));
    assert_eq!(svc.decode(svc.minimalist()).unwrap(), TokenValues::new());
}

#[test]
fn minimalist_is_identical_across_instances() {
    let a = service_with_key(&[0x11; 16]);
    let b = service_with_key(&[0x11; 16]);
    assert_eq!(a.minimalist(), b.minimalist());

    // And each accepts the other's minimalist token via the fast path.
    assert_eq!(a.decode(b.minimalist()).unwrap(), TokenValues::new());
}

#[test]
fn ipv4_and_one_uint() {
    let svc = service();

    let mut tv = TokenValues::new();
    tv.expires = EXPIRY_2030;
    tv.set_remote_ip(IpAddr::from([11, 22, 33, 44]));
    tv.set_u64(0, 0x1234).unwrap();

    let token = svc.encode(&tv).unwrap();
    let back = svc.decode(&token).unwrap();

    assert!(back.expires <= EXPIRY_2030 && EXPIRY_2030 - back.expires <= 20);
    assert_eq!(back.address, Some(IpAddr::from([11, 22, 33, 44])));
    assert_eq!(back.get_u64(0), Ok(0x1234));
}

#[test]
fn ipv6_seven_strings_compresses() {
    let svc = service();
    let repetitive = "123456789-B-123456789-C-123456789-D-123456789-E-123456789";

    let mut tv = TokenValues::new();
    tv.set_remote_ip(IpAddr::from([1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]));
    for key in 0..7 {
        tv.set_str(key, repetitive).unwrap();
    }

    let token = svc.encode(&tv).unwrap();
    let back = svc.decode(&token).unwrap();
    assert_eq!(back.values, tv.values);
    assert_eq!(back.address, tv.address);

    // Repetitive payload compresses: the token text undercuts what an
    // uncompressed encoding would need (sealed size + ~23% Base91 overhead).
    let raw_plaintext = 3 + 3 + 16 + 7 * (1 + repetitive.len());
    let raw_sealed = 12 + raw_plaintext + 16;
    assert!(
        token.len() < raw_sealed * 16 / 14,
        "token {} chars does not undercut the raw rendering",
        token.len()
    );
}

#[test]
fn too_many_values_fails_before_sealing() {
    let svc = service();

    let mut tv = TokenValues::new();
    tv.values = vec![vec![7u8]; 69];

    assert_eq!(
        svc.encode(&tv).unwrap_err(),
        TokenError::Wire(adamant_core::WireError::TooManyValues { count: 69, max: 31 })
    );
}

#[test]
fn tampering_is_detected() {
    let svc = service();

    let mut tv = TokenValues::new();
    tv.set_str(0, "alice").unwrap();
    tv.set_bool(1, true).unwrap();
    let token = svc.encode(&tv).unwrap();

    // Swap one character for another from the same alphabet so the text
    // still Base91-decodes; the AEAD must then refuse it.
    let bytes = token.as_bytes();
    let mut flipped = 0;
    for at in 0..bytes.len() {
        for &candidate in adamant_core::Base91::ALPHABET.iter() {
            if candidate == bytes[at] {
                continue;
            }
            let mut tampered = bytes.to_vec();
            tampered[at] = candidate;
            let tampered = String::from_utf8(tampered).unwrap();

            match svc.decode(&tampered) {
                Err(TokenError::Crypto | TokenError::Base91 { .. } | TokenError::MagicMismatch) => {
                    flipped += 1;
                },
                Err(other) => panic!("unexpected error {other:?}"),
                Ok(_) => panic!("tampered token accepted (byte {at})"),
            }
            break;
        }
    }
    assert!(flipped > 0);
}

#[test]
fn wrong_key_is_rejected() {
    let a = service_with_key(&[0xAA; 16]);
    let b = service_with_key(&[0xBB; 16]);

    let mut tv = TokenValues::new();
    tv.set_str(0, "alice").unwrap();
    let token = a.encode(&tv).unwrap();

    match b.decode(&token) {
        Err(TokenError::Crypto | TokenError::Base91 { .. } | TokenError::MagicMismatch) => {},
        other => panic!("cross-key decode must fail, got {other:?}"),
    }
}

#[test]
fn chacha_key_round_trips() {
    let svc = service_with_key(&[0x5E; 32]);

    let tv = TokenValues::with(&[KeyVal::str(0, "alice"), KeyVal::u64(1, 99)]).unwrap();
    let token = svc.encode(&tv).unwrap();
    assert_eq!(svc.decode(&token).unwrap(), tv);
}

#[test]
fn bearer_envelope_round_trips() {
    let svc = service();

    let tv = TokenValues::with(&[KeyVal::str(0, "alice")]).unwrap();
    let header = svc.bearer(&tv).unwrap();
    assert!(header.starts_with("Bearer i:"));

    let token = svc.bearer_token(&header).unwrap();
    assert_eq!(svc.decode(token).unwrap(), tv);
}

#[test]
fn cookie_envelope_round_trips() {
    let svc = service();

    let tv = TokenValues::with(&[KeyVal::u64(0, 31337)]).unwrap();
    let cookie = svc.new_cookie(&tv).unwrap();
    assert_eq!(cookie.name(), "session");

    let token = svc.cookie_token(cookie.value()).unwrap();
    assert_eq!(svc.decode(token).unwrap(), tv);
}

#[test]
fn dead_cookie_clears_the_session() {
    let svc = service();
    let dead = svc.dead_cookie();
    assert_eq!(dead.name(), svc.cookie_name());
    assert_eq!(dead.value(), "");
    assert_eq!(dead.max_age(), Some(cookie::time::Duration::ZERO));
}

#[test]
fn validation_follows_decode() {
    let svc = Adamant::new(&localhost(), &[3u8; 16], "", 600, true).unwrap();
    let remote: IpAddr = "198.51.100.9".parse().unwrap();

    let tv = svc.new_token_values(Some(remote)).unwrap();
    let token = svc.encode(&tv).unwrap();
    let back = svc.decode(&token).unwrap();

    assert_eq!(back.valid(Some(remote)), Ok(()));
    assert!(back.valid(Some("198.51.100.10".parse().unwrap())).is_err());
    assert!(back.valid(None).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn encode_decode_law(
        values in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..=255), 0..=31),
        use_v6 in any::<Option<bool>>(),
        seed in any::<u8>(),
    ) {
        let svc = service_with_key(&[seed; 16]);

        let mut tv = TokenValues { expires: 0, address: None, values };
        match use_v6 {
            Some(true) => tv.set_remote_ip(IpAddr::from([seed; 16])),
            Some(false) => tv.set_remote_ip(IpAddr::from([seed, 1, 2, 3])),
            None => {},
        }

        let token = svc.encode(&tv).expect("well-formed record");
        prop_assert_eq!(svc.decode(&token).expect("own token"), tv);
    }
}
