//! Minimal-length little-endian integer coding for value slots.
//!
//! `0` encodes as the empty slot; anything else takes the fewest bytes that
//! hold its most significant set bit, up to 8.

use crate::errors::{Result, WireError};

/// Encode a u64 as its minimal little-endian byte string.
#[must_use]
pub fn uint64_to_bytes(v: u64) -> Vec<u8> {
    let used = (64 - v.leading_zeros() as usize).div_ceil(8);
    v.to_le_bytes()[..used].to_vec()
}

/// Decode a minimal little-endian byte string back to a u64.
///
/// # Errors
///
/// Returns [`WireError::UintTooWide`] when the slot is longer than 8 bytes.
pub fn bytes_to_uint64(buf: &[u8]) -> Result<u64> {
    if buf.len() > 8 {
        return Err(WireError::UintTooWide { len: buf.len() });
    }
    let mut raw = [0u8; 8];
    raw[..buf.len()].copy_from_slice(buf);
    Ok(u64::from_le_bytes(raw))
}
