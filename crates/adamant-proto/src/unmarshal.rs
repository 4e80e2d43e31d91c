//! Token deserialization.
//!
//! `unmarshal` parses a post-AEAD plaintext back into a [`TokenValues`].
//! Every size claim in the buffer is checked before it is honored: minimum
//! size, padding trailer, metadata-implied payload floor, per-value lengths,
//! and finally that nothing trails the last declared value. Authentication
//! already happened upstream; these checks catch wrong-dialect peers and
//! corrupted plaintexts, not attackers.

use std::net::IpAddr;

use crate::{
    errors::{Result, WireError},
    expiry::{self, EXPIRY_SIZE},
    metadata::{Metadata, HEADER_SIZE},
    padding::{drop_padding, ENABLE_PADDING},
    values::TokenValues,
};

/// Smallest well-formed token plaintext: header plus the expiry field.
pub const MIN_PLAINTEXT_SIZE: usize = HEADER_SIZE + EXPIRY_SIZE;

/// Parse a token plaintext.
///
/// # Errors
///
/// Any malformed size claim yields a structured [`WireError`]; callers treat
/// all of them as "invalid token".
pub fn unmarshal(buf: &[u8]) -> Result<TokenValues> {
    if buf.len() < MIN_PLAINTEXT_SIZE {
        return Err(WireError::TooShort { expected: MIN_PLAINTEXT_SIZE, actual: buf.len() });
    }

    let meta = Metadata::from_header(buf);
    let mut rest = &buf[HEADER_SIZE..];

    if ENABLE_PADDING {
        rest = drop_padding(rest)?;
    }

    let decompressed;
    let mut payload: &[u8] = if meta.is_compressed() {
        decompressed = snap::raw::Decoder::new()
            .decompress_vec(rest)
            .map_err(|e| WireError::Decompress(e.to_string()))?;
        &decompressed
    } else {
        rest
    };

    if payload.len() < meta.payload_min_size() {
        return Err(WireError::PayloadTooShort {
            expected: meta.payload_min_size(),
            actual: payload.len(),
        });
    }

    let expires = expiry::internal_to_unix(expiry::read_internal(payload));
    payload = &payload[EXPIRY_SIZE..];

    let address = match meta.address_len() {
        0 => None,
        4 => {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(&payload[..4]);
            payload = &payload[4..];
            Some(IpAddr::from(octets))
        },
        _ => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&payload[..16]);
            payload = &payload[16..];
            Some(IpAddr::from(octets))
        },
    };

    let values = parse_values(payload, meta.value_count())?;

    Ok(TokenValues { expires, address, values })
}

fn parse_values(mut buf: &[u8], n: usize) -> Result<Vec<Vec<u8>>> {
    let mut values = Vec::with_capacity(n);

    for index in 0..n {
        // Each remaining value needs at least its length byte.
        if buf.len() < n - index {
            return Err(WireError::ValueTruncated { index, available: buf.len() });
        }

        let size = buf[0] as usize;
        buf = &buf[1..];

        if buf.len() < size {
            return Err(WireError::ValueTruncated { index, available: buf.len() });
        }

        values.push(buf[..size].to_vec());
        buf = &buf[size..];
    }

    if !buf.is_empty() {
        return Err(WireError::TrailingBytes { count: buf.len() });
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;
    use crate::marshal::marshal;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0xDEC0)
    }

    #[test]
    fn rejects_short_buffer() {
        assert_eq!(
            unmarshal(&[0u8; MIN_PLAINTEXT_SIZE - 1]),
            Err(WireError::TooShort { expected: MIN_PLAINTEXT_SIZE, actual: 5 })
        );
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut buf = marshal(&TokenValues::new(), 1, &mut rng()).unwrap();
        buf.push(0xEE);
        assert_eq!(unmarshal(&buf), Err(WireError::TrailingBytes { count: 1 }));
    }

    #[test]
    fn rejects_value_count_beyond_bytes() {
        let mut buf = marshal(&TokenValues::new(), 1, &mut rng()).unwrap();
        buf[2] |= 3; // claim three values the buffer does not carry
        assert!(matches!(unmarshal(&buf), Err(WireError::PayloadTooShort { .. })));
    }

    #[test]
    fn rejects_value_length_beyond_bytes() {
        let mut tv = TokenValues::new();
        tv.set_str(0, "ab").unwrap();
        let mut buf = marshal(&tv, 1, &mut rng()).unwrap();

        // Inflate the length prefix of value #0 past the buffer end.
        let len_at = MIN_PLAINTEXT_SIZE;
        buf[len_at] = 200;
        assert!(matches!(unmarshal(&buf), Err(WireError::ValueTruncated { index: 0, .. })));
    }

    #[test]
    fn rejects_garbage_compression() {
        let mut buf = marshal(&TokenValues::new(), 1, &mut rng()).unwrap();
        buf[2] |= 0b0010_0000; // flip the compressed bit over a raw payload
        assert!(unmarshal(&buf).is_err());
    }

    #[test]
    fn empty_values_round_trip() {
        let mut tv = TokenValues::new();
        tv.set_str(0, "").unwrap();
        tv.set_str(1, "").unwrap();

        let buf = marshal(&tv, 1, &mut rng()).unwrap();
        let back = unmarshal(&buf).unwrap();
        assert_eq!(back.values, vec![Vec::<u8>::new(); 2]);
    }
}
