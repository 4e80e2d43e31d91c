//! Optional random padding, OFF by default.
//!
//! When enabled, the serialized buffer is padded with random bytes to the
//! next 8-byte boundary plus 0..3 extra 8-byte blocks of noise, hiding the
//! exact payload length. The final byte stores the number of random bytes
//! (`padding_length - 1`); decoders verify it and truncate.
//!
//! [`ENABLE_PADDING`] is a build-time constant: a deployed fleet speaks one
//! dialect, and flipping it is a wire-breaking change.

use rand::Rng;

use crate::errors::{Result, WireError};

/// Whether encode pads the sealed plaintext. Build-time constant.
pub const ENABLE_PADDING: bool = false;

pub(crate) const PADDING_STEP: usize = 8;

/// Largest padding run the trailer byte may claim
pub(crate) const PADDING_MAX: usize = 3 * PADDING_STEP;

/// Append random padding and the trailer byte.
pub(crate) fn append_padding<R: Rng>(buf: &mut Vec<u8>, rng: &mut R) {
    let trailing = buf.len() % PADDING_STEP;
    let mut adding = PADDING_STEP - trailing - 1; // the trailer byte completes the block
    adding += PADDING_STEP * rng.gen_range(0..PADDING_MAX / PADDING_STEP);

    let start = buf.len();
    buf.resize(start + adding, 0);
    rng.fill_bytes(&mut buf[start..]);

    #[allow(clippy::cast_possible_truncation)]
    buf.push(adding as u8);

    debug_assert_eq!(buf.len() % PADDING_STEP, 0);
}

/// Strip the padding run declared by the trailer byte.
///
/// # Errors
///
/// Returns [`WireError::PaddingTooLarge`] for a trailer claiming more than
/// [`PADDING_MAX`] bytes, and [`WireError::TooShort`] when the buffer cannot
/// even hold the claimed run.
pub(crate) fn drop_padding(buf: &[u8]) -> Result<&[u8]> {
    let Some((&trailer, _)) = buf.split_last() else {
        return Err(WireError::TooShort { expected: 1, actual: 0 });
    };

    let pad = trailer as usize;
    if pad > PADDING_MAX {
        return Err(WireError::PaddingTooLarge { len: pad, max: PADDING_MAX });
    }
    if buf.len() < pad + 1 {
        return Err(WireError::TooShort { expected: pad + 1, actual: buf.len() });
    }

    Ok(&buf[..buf.len() - pad - 1])
}
