//! Token header and bit-packed metadata byte.
//!
//! The plaintext opens with a fixed 3-byte header:
//!
//! ```text
//! offset 0: magic     per-instance byte, cheap wrong-instance detector
//! offset 1: salt      fresh random byte per encode
//! offset 2: metadata  bit-packed, see below
//! ```
//!
//! The metadata byte packs three flag bits and a 5-bit value count:
//!
//! ```text
//! bit 7      address present
//! bit 6      address is IPv4 (meaningful only when bit 7 is set)
//! bit 5      payload is Snappy-compressed
//! bits 4..0  number of positional values, 0..=31
//! ```

use bitflags::bitflags;

use crate::errors::{Result, WireError};

/// Size of the fixed header (magic + salt + metadata)
pub const HEADER_SIZE: usize = 3;

/// Maximum number of positional values a token can carry
pub const MAX_VALUES: usize = VALUE_COUNT_MASK as usize;

const VALUE_COUNT_MASK: u8 = 0b0001_1111;

bitflags! {
    /// Flag bits of the metadata byte (high three bits)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MetaFlags: u8 {
        /// A client address follows the expiry field
        const ADDRESS = 0b1000_0000;

        /// The address is 4 bytes (IPv4); 16 bytes (IPv6) otherwise
        const ADDRESS_V4 = 0b0100_0000;

        /// The post-header payload is Snappy-compressed
        const COMPRESSED = 0b0010_0000;
    }
}

/// The packed metadata byte at offset 2 of the header.
///
/// All 256 byte values parse; consistency with the rest of the buffer is
/// checked during [`unmarshal`](crate::unmarshal) instead, so a tampered
/// metadata byte surfaces as a structured decode error rather than UB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata(u8);

impl Metadata {
    /// Pack an address length, compression flag and value count.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::BadAddressLength`] unless the address length is
    /// 0, 4 or 16, and [`WireError::TooManyValues`] when the count exceeds
    /// [`MAX_VALUES`].
    pub fn new(address_len: usize, compressed: bool, n_values: usize) -> Result<Self> {
        let mut flags = match address_len {
            0 => MetaFlags::empty(),
            4 => MetaFlags::ADDRESS | MetaFlags::ADDRESS_V4,
            16 => MetaFlags::ADDRESS,
            len => return Err(WireError::BadAddressLength { len }),
        };

        if compressed {
            flags |= MetaFlags::COMPRESSED;
        }

        if n_values > MAX_VALUES {
            return Err(WireError::TooManyValues { count: n_values, max: MAX_VALUES });
        }

        Ok(Self(flags.bits() | n_values as u8))
    }

    /// Reinterpret a raw metadata byte
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// The raw metadata byte
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// Read the metadata byte out of a header-prefixed buffer.
    ///
    /// The caller must have checked `buf.len() >= HEADER_SIZE`.
    #[must_use]
    pub const fn from_header(buf: &[u8]) -> Self {
        Self(buf[2])
    }

    fn flags(self) -> MetaFlags {
        MetaFlags::from_bits_truncate(self.0)
    }

    /// Length in bytes of the embedded address: 0, 4 or 16
    #[must_use]
    pub fn address_len(self) -> usize {
        let flags = self.flags();
        if flags.contains(MetaFlags::ADDRESS_V4) {
            4
        } else if flags.contains(MetaFlags::ADDRESS) {
            16
        } else {
            0
        }
    }

    /// Whether the post-header payload is compressed
    #[must_use]
    pub fn is_compressed(self) -> bool {
        self.flags().contains(MetaFlags::COMPRESSED)
    }

    /// Number of positional values declared by the header
    #[must_use]
    pub const fn value_count(self) -> usize {
        (self.0 & VALUE_COUNT_MASK) as usize
    }

    /// Smallest payload (expiry + address + one length byte per value) that
    /// can satisfy this metadata byte
    #[must_use]
    pub fn payload_min_size(self) -> usize {
        crate::expiry::EXPIRY_SIZE + self.address_len() + self.value_count()
    }
}

/// The magic byte at offset 0 of a token plaintext.
///
/// The caller must have checked `buf.len() >= HEADER_SIZE`.
#[must_use]
pub const fn magic_code(buf: &[u8]) -> u8 {
    buf[0]
}
