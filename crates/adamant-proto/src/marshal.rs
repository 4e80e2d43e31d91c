//! Token serialization.
//!
//! `marshal` turns a [`TokenValues`] into the plaintext that gets sealed:
//! header, expiry, address, then the length-prefixed value records, with the
//! post-header payload optionally Snappy-compressed.
//!
//! Randomness (the salt byte, the compression coin, padding bytes) comes
//! from the caller's RNG, so tests and the deterministic minimalist encode
//! can pin the output while production callers pass a cheap thread-local
//! generator.

use bytes::BufMut;
use rand::Rng;

use crate::{
    errors::{Result, WireError},
    expiry::{self, EXPIRY_SIZE},
    metadata::{Metadata, HEADER_SIZE},
    padding::{append_padding, ENABLE_PADDING, PADDING_MAX},
    values::TokenValues,
};

/// Largest encodable single value
pub const MAX_VALUE_LEN: usize = u8::MAX as usize;

/// Below this payload size, never compress
pub const SIZE_MAY_COMPRESS: usize = 50;

/// At or above this payload size, always compress
pub const SIZE_MUST_COMPRESS: usize = 99;

/// Sizing and policy decisions for one marshal run.
#[derive(Debug, Clone, Copy)]
struct Serializer {
    address_len: usize,
    n_values: usize,
    payload_size: usize,
    compressed: bool,
}

impl Serializer {
    fn new<R: Rng>(tv: &TokenValues, rng: &mut R) -> Self {
        let address_len = tv.address.map_or(0, |ip| match ip {
            std::net::IpAddr::V4(_) => 4,
            std::net::IpAddr::V6(_) => 16,
        });

        let n_values = tv.values.len();
        let val_total_size: usize = n_values + tv.values.iter().map(Vec::len).sum::<usize>();

        let payload_size = EXPIRY_SIZE + address_len + val_total_size;

        Self {
            address_len,
            n_values,
            payload_size,
            compressed: should_compress(payload_size, rng),
        }
    }
}

/// Decide whether to compress the payload.
///
/// The middle band is a coin toss: identical plaintexts do not always map to
/// the same ciphertext length, which blunts chosen-plaintext length oracles.
fn should_compress<R: Rng>(payload_size: usize, rng: &mut R) -> bool {
    if payload_size < SIZE_MAY_COMPRESS {
        false
    } else if payload_size < SIZE_MUST_COMPRESS {
        rng.gen_bool(0.5)
    } else {
        true
    }
}

/// Serialize a token record into its sealed-plaintext form.
///
/// On success the first byte equals `magic` and the metadata byte at offset
/// 2 is consistent with the rest of the buffer.
///
/// # Errors
///
/// [`WireError::TooManyValues`] past 31 values, [`WireError::ValueTooLarge`]
/// for a value over 255 bytes, [`WireError::ExpiryOutOfRange`] for an
/// unrepresentable expiry.
pub fn marshal<R: Rng>(tv: &TokenValues, magic: u8, rng: &mut R) -> Result<Vec<u8>> {
    let s = Serializer::new(tv, rng);

    let meta = Metadata::new(s.address_len, s.compressed, s.n_values)?;
    let internal = expiry::unix_to_internal(tv.expires)?;

    let mut capacity = HEADER_SIZE + s.payload_size;
    if ENABLE_PADDING {
        capacity += PADDING_MAX + 1;
    }
    let mut buf = Vec::with_capacity(capacity);

    buf.put_u8(magic);
    buf.put_u8(rng.gen::<u8>()); // salt
    buf.put_u8(meta.to_byte());

    expiry::put_internal(&mut buf, internal);

    match tv.address {
        None => {},
        Some(std::net::IpAddr::V4(v4)) => buf.put_slice(&v4.octets()),
        Some(std::net::IpAddr::V6(v6)) => buf.put_slice(&v6.octets()),
    }

    for (index, value) in tv.values.iter().enumerate() {
        if value.len() > MAX_VALUE_LEN {
            return Err(WireError::ValueTooLarge {
                index,
                len: value.len(),
                max: MAX_VALUE_LEN,
            });
        }
        #[allow(clippy::cast_possible_truncation)]
        buf.put_u8(value.len() as u8);
        buf.put_slice(value);
    }

    if buf.len() != HEADER_SIZE + s.payload_size {
        return Err(WireError::LengthMismatch {
            expected: HEADER_SIZE + s.payload_size,
            actual: buf.len(),
        });
    }

    if s.compressed {
        let packed = snap::raw::Encoder::new()
            .compress_vec(&buf[HEADER_SIZE..])
            .map_err(|e| WireError::Compress(e.to_string()))?;
        buf.truncate(HEADER_SIZE);
        buf.put_slice(&packed);
    }

    if ENABLE_PADDING {
        append_padding(&mut buf, rng);
    }

    Ok(buf)
}
