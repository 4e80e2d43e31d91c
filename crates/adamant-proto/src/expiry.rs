//! Expiry field coding.
//!
//! The expiry is stored just after the header in a fixed little-endian field
//! of [`EXPIRY_SIZE`] bytes with 20-second precision, offset from the start
//! of 2022. With the default 3-byte field the window spans 2^24 * 20 s, about
//! 10.6 years.
//!
//! The Unix time `0` round-trips as `0` and means "no expiry". Changing
//! [`EXPIRY_SIZE`] is a wire-breaking change; a deployed fleet must agree on
//! one width.

use crate::errors::{Result, WireError};

/// Width of the expiry field in bytes. Valid range 1..=4; default 3.
pub const EXPIRY_SIZE: usize = 3;

/// Granularity of the stored expiry in seconds
pub const PRECISION_SECONDS: i64 = 20;

/// First calendar year representable by the internal coding
pub const EXPIRY_START_YEAR: i64 = 2022;

// Average Gregorian year: 365.2425 days of 86400 seconds.
const SECONDS_PER_YEAR: i64 = 31_556_952;

/// Unix time of the internal epoch (start of the representable window)
pub const EXPIRY_START_UNIX: i64 = (EXPIRY_START_YEAR - 1970) * SECONDS_PER_YEAR;

const INTERNAL_TO_UNIX: i64 = EXPIRY_START_UNIX;

const EXPIRY_MAX: u64 = 1 << (EXPIRY_SIZE * 8);

/// Convert a Unix time to the internal truncated coding.
///
/// # Errors
///
/// Returns [`WireError::ExpiryOutOfRange`] when `unix` is nonzero and falls
/// before the start year or beyond the representable window.
pub fn unix_to_internal(unix: i64) -> Result<u32> {
    if unix == 0 {
        return Ok(0);
    }

    let since_start = unix
        .checked_sub(INTERNAL_TO_UNIX)
        .filter(|s| *s >= 0)
        .ok_or(WireError::ExpiryOutOfRange { unix })?;

    let internal = since_start / PRECISION_SECONDS;
    if internal as u64 >= EXPIRY_MAX {
        return Err(WireError::ExpiryOutOfRange { unix });
    }

    u32::try_from(internal).map_err(|_| WireError::ExpiryOutOfRange { unix })
}

/// Convert the internal coding back to Unix seconds. `0` stays `0`.
#[must_use]
pub fn internal_to_unix(internal: u32) -> i64 {
    if internal == 0 {
        return 0;
    }
    i64::from(internal) * PRECISION_SECONDS + INTERNAL_TO_UNIX
}

/// Append the internal expiry as `EXPIRY_SIZE` little-endian bytes.
pub(crate) fn put_internal(buf: &mut Vec<u8>, internal: u32) {
    buf.extend_from_slice(&internal.to_le_bytes()[..EXPIRY_SIZE]);
}

/// Read the internal expiry from the front of `buf`.
///
/// The caller must have checked `buf.len() >= EXPIRY_SIZE`.
pub(crate) fn read_internal(buf: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw[..EXPIRY_SIZE].copy_from_slice(&buf[..EXPIRY_SIZE]);
    u32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_no_expiry() {
        assert_eq!(unix_to_internal(0), Ok(0));
        assert_eq!(internal_to_unix(0), 0);
    }

    #[test]
    fn round_trips_within_precision() {
        let unix = INTERNAL_TO_UNIX + 123_456_789;
        let internal = unix_to_internal(unix).expect("in range");
        let back = internal_to_unix(internal);
        assert!(unix - back < PRECISION_SECONDS, "got {back}, want near {unix}");
        assert!(back <= unix);
    }

    #[test]
    fn rejects_before_start_year() {
        let unix = INTERNAL_TO_UNIX - 1;
        assert_eq!(unix_to_internal(unix), Err(WireError::ExpiryOutOfRange { unix }));
    }

    #[test]
    fn rejects_beyond_window() {
        let first_bad = INTERNAL_TO_UNIX + (EXPIRY_MAX as i64) * PRECISION_SECONDS;
        assert!(unix_to_internal(first_bad - 1).is_ok());
        assert_eq!(
            unix_to_internal(first_bad),
            Err(WireError::ExpiryOutOfRange { unix: first_bad })
        );
    }

    #[test]
    fn field_coding_is_little_endian() {
        let mut buf = Vec::new();
        put_internal(&mut buf, 0x0304_05);
        assert_eq!(buf, [0x05, 0x04, 0x03]);
        assert_eq!(read_internal(&buf), 0x0304_05);
    }
}
