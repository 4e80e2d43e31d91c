//! Typed positional accessors over the value slots.
//!
//! The wire format is byte-oriented and index-addressed; this module layers
//! typed getters and setters on top:
//!
//! | type | slot encoding |
//! |---|---|
//! | u64 / i64 | minimal little-endian, `0` is the empty slot |
//! | bool | `[]` false, `[0x00]` true, anything longer is an error |
//! | str | raw UTF-8 bytes |
//!
//! Writes address slots `0..=31`; writing one slot past the end appends,
//! writing further grows the record with empty slots in between. The `*_or`
//! getters swallow errors and hand back the supplied default.

use crate::{
    errors::{Result, WireError},
    metadata::MAX_VALUES,
    uint::{bytes_to_uint64, uint64_to_bytes},
    values::TokenValues,
};

impl TokenValues {
    /// Build a record and apply a batch of typed writes in one go.
    ///
    /// # Errors
    ///
    /// Returns the first failing write; the error carries the offending key.
    pub fn with(key_values: &[KeyVal]) -> Result<Self> {
        let mut tv = Self::new();
        tv.set_all(key_values)?;
        Ok(tv)
    }

    /// Read slot `key` as a u64.
    ///
    /// # Errors
    ///
    /// [`WireError::KeyOutOfRange`] for an unpopulated slot,
    /// [`WireError::UintTooWide`] for a slot longer than 8 bytes.
    pub fn get_u64(&self, key: usize) -> Result<u64> {
        bytes_to_uint64(self.slot(key)?)
    }

    /// Write `val` to slot `key` as a minimal little-endian u64.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::KeyTooLarge`] when `key` exceeds the addressable
    /// range.
    pub fn set_u64(&mut self, key: usize, val: u64) -> Result<()> {
        self.set_slot(key, uint64_to_bytes(val))
    }

    /// Read slot `key` as an i64 (bit-cast from the u64 coding).
    ///
    /// # Errors
    ///
    /// Same conditions as [`get_u64`](Self::get_u64).
    pub fn get_i64(&self, key: usize) -> Result<i64> {
        self.get_u64(key).map(|v| i64::from_ne_bytes(v.to_ne_bytes()))
    }

    /// Write `val` to slot `key`, bit-cast to the u64 coding.
    ///
    /// # Errors
    ///
    /// Same conditions as [`set_u64`](Self::set_u64).
    pub fn set_i64(&mut self, key: usize, val: i64) -> Result<()> {
        self.set_u64(key, u64::from_ne_bytes(val.to_ne_bytes()))
    }

    /// Read slot `key` as a bool.
    ///
    /// # Errors
    ///
    /// [`WireError::KeyOutOfRange`] for an unpopulated slot,
    /// [`WireError::NotBoolean`] for a slot longer than one byte.
    pub fn get_bool(&self, key: usize) -> Result<bool> {
        match self.slot(key)?.len() {
            0 => Ok(false),
            1 => Ok(true),
            len => Err(WireError::NotBoolean { len }),
        }
    }

    /// Write `val` to slot `key` in the empty/one-byte bool coding.
    ///
    /// # Errors
    ///
    /// Same conditions as [`set_u64`](Self::set_u64).
    pub fn set_bool(&mut self, key: usize, val: bool) -> Result<()> {
        self.set_slot(key, if val { vec![0] } else { Vec::new() })
    }

    /// Read slot `key` as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// [`WireError::KeyOutOfRange`] for an unpopulated slot,
    /// [`WireError::InvalidUtf8`] for non-UTF-8 bytes.
    pub fn get_str(&self, key: usize) -> Result<String> {
        String::from_utf8(self.slot(key)?.to_vec()).map_err(|_| WireError::InvalidUtf8 { key })
    }

    /// Write `val` to slot `key` as raw UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Same conditions as [`set_u64`](Self::set_u64).
    pub fn set_str(&mut self, key: usize, val: &str) -> Result<()> {
        self.set_slot(key, val.as_bytes().to_vec())
    }

    /// Infallible [`get_u64`](Self::get_u64); `default` on any error.
    #[must_use]
    pub fn get_u64_or(&self, key: usize, default: u64) -> u64 {
        self.get_u64(key).unwrap_or(default)
    }

    /// Infallible [`get_i64`](Self::get_i64); `default` on any error.
    #[must_use]
    pub fn get_i64_or(&self, key: usize, default: i64) -> i64 {
        self.get_i64(key).unwrap_or(default)
    }

    /// Infallible [`get_bool`](Self::get_bool); `default` on any error.
    #[must_use]
    pub fn get_bool_or(&self, key: usize, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Infallible [`get_str`](Self::get_str); `default` on any error.
    #[must_use]
    pub fn get_str_or(&self, key: usize, default: &str) -> String {
        self.get_str(key).unwrap_or_else(|_| default.to_owned())
    }

    /// Apply a batch of typed writes.
    ///
    /// # Errors
    ///
    /// Stops at the first failing write and returns its error; earlier
    /// writes stick.
    pub fn set_all(&mut self, key_values: &[KeyVal]) -> Result<()> {
        for kv in key_values {
            kv.apply(self)?;
        }
        Ok(())
    }

    /// Fill a batch of typed reads in place.
    ///
    /// # Errors
    ///
    /// Stops at the first failing read and returns its error.
    pub fn get_all(&self, key_values: &mut [KeyVal]) -> Result<()> {
        for kv in key_values {
            kv.fetch(self)?;
        }
        Ok(())
    }

    fn slot(&self, key: usize) -> Result<&[u8]> {
        self.values
            .get(key)
            .map(Vec::as_slice)
            .ok_or(WireError::KeyOutOfRange { key, len: self.values.len() })
    }

    fn set_slot(&mut self, key: usize, buf: Vec<u8>) -> Result<()> {
        if key > MAX_VALUES {
            return Err(WireError::KeyTooLarge { key, max: MAX_VALUES });
        }
        if key >= self.values.len() {
            self.values.resize_with(key + 1, Vec::new);
        }
        self.values[key] = buf;
        Ok(())
    }
}

/// One typed key/value pair for the batch helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyVal {
    /// Unsigned 64-bit slot
    U64 {
        /// Slot index
        key: usize,
        /// Slot value
        val: u64,
    },
    /// Signed 64-bit slot
    I64 {
        /// Slot index
        key: usize,
        /// Slot value
        val: i64,
    },
    /// Boolean slot
    Bool {
        /// Slot index
        key: usize,
        /// Slot value
        val: bool,
    },
    /// UTF-8 string slot
    Str {
        /// Slot index
        key: usize,
        /// Slot value
        val: String,
    },
}

impl KeyVal {
    /// A u64 pair.
    #[must_use]
    pub const fn u64(key: usize, val: u64) -> Self {
        Self::U64 { key, val }
    }

    /// An i64 pair.
    #[must_use]
    pub const fn i64(key: usize, val: i64) -> Self {
        Self::I64 { key, val }
    }

    /// A bool pair.
    #[must_use]
    pub const fn bool(key: usize, val: bool) -> Self {
        Self::Bool { key, val }
    }

    /// A string pair.
    #[must_use]
    pub fn str(key: usize, val: impl Into<String>) -> Self {
        Self::Str { key, val: val.into() }
    }

    /// The slot index this pair addresses.
    #[must_use]
    pub const fn key(&self) -> usize {
        match self {
            Self::U64 { key, .. }
            | Self::I64 { key, .. }
            | Self::Bool { key, .. }
            | Self::Str { key, .. } => *key,
        }
    }

    fn apply(&self, tv: &mut TokenValues) -> Result<()> {
        match self {
            Self::U64 { key, val } => tv.set_u64(*key, *val),
            Self::I64 { key, val } => tv.set_i64(*key, *val),
            Self::Bool { key, val } => tv.set_bool(*key, *val),
            Self::Str { key, val } => tv.set_str(*key, val),
        }
    }

    fn fetch(&mut self, tv: &TokenValues) -> Result<()> {
        match self {
            Self::U64 { key, val } => *val = tv.get_u64(*key)?,
            Self::I64 { key, val } => *val = tv.get_i64(*key)?,
            Self::Bool { key, val } => *val = tv.get_bool(*key)?,
            Self::Str { key, val } => *val = tv.get_str(*key)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_round_trip() {
        let mut tv = TokenValues::new();
        tv.set_u64(0, 0x1234).unwrap();
        assert_eq!(tv.get_u64(0), Ok(0x1234));
        assert_eq!(tv.values[0], [0x34, 0x12]);
    }

    #[test]
    fn zero_u64_is_empty_slot() {
        let mut tv = TokenValues::new();
        tv.set_u64(0, 0).unwrap();
        assert!(tv.values[0].is_empty());
        assert_eq!(tv.get_u64(0), Ok(0));
    }

    #[test]
    fn i64_negative_round_trip() {
        let mut tv = TokenValues::new();
        tv.set_i64(0, -12345).unwrap();
        assert_eq!(tv.get_i64(0), Ok(-12345));
        // Bit-cast coding: a small negative value occupies the full 8 bytes.
        assert_eq!(tv.values[0].len(), 8);
    }

    #[test]
    fn bool_codings() {
        let mut tv = TokenValues::new();
        tv.set_bool(0, false).unwrap();
        tv.set_bool(1, true).unwrap();
        assert_eq!(tv.get_bool(0), Ok(false));
        assert_eq!(tv.get_bool(1), Ok(true));
        assert_eq!(tv.values[0], Vec::<u8>::new());
        assert_eq!(tv.values[1], [0x00]);

        tv.values[1] = vec![0, 0];
        assert_eq!(tv.get_bool(1), Err(WireError::NotBoolean { len: 2 }));
    }

    #[test]
    fn str_round_trip() {
        let mut tv = TokenValues::new();
        tv.set_str(0, "garçon").unwrap();
        assert_eq!(tv.get_str(0).as_deref(), Ok("garçon"));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut tv = TokenValues::new();
        tv.values.push(vec![0xFF, 0xFE]);
        assert_eq!(tv.get_str(0), Err(WireError::InvalidUtf8 { key: 0 }));
        assert_eq!(tv.get_str_or(0, "fallback"), "fallback");
    }

    #[test]
    fn read_past_end_fails() {
        let tv = TokenValues::new();
        assert_eq!(tv.get_u64(0), Err(WireError::KeyOutOfRange { key: 0, len: 0 }));
        assert_eq!(tv.get_u64_or(0, 7), 7);
    }

    #[test]
    fn sparse_write_grows_with_empty_slots() {
        let mut tv = TokenValues::new();
        tv.set_u64(3, 9).unwrap();
        assert_eq!(tv.values.len(), 4);
        assert!(tv.values[0].is_empty());
        assert_eq!(tv.get_u64(3), Ok(9));
        // The backfilled slots read as zero / false / empty.
        assert_eq!(tv.get_u64(1), Ok(0));
        assert_eq!(tv.get_bool(2), Ok(false));
    }

    #[test]
    fn write_past_addressable_range_fails() {
        let mut tv = TokenValues::new();
        assert!(tv.set_u64(31, 1).is_ok());
        assert_eq!(tv.set_u64(32, 1), Err(WireError::KeyTooLarge { key: 32, max: 31 }));
    }

    #[test]
    fn overwrite_keeps_length() {
        let mut tv = TokenValues::new();
        tv.set_str(0, "one").unwrap();
        tv.set_str(0, "two").unwrap();
        assert_eq!(tv.values.len(), 1);
        assert_eq!(tv.get_str(0).as_deref(), Ok("two"));
    }

    #[test]
    fn batch_set_and_get() {
        let tv = TokenValues::with(&[
            KeyVal::u64(0, 42),
            KeyVal::bool(1, true),
            KeyVal::str(2, "session"),
            KeyVal::i64(3, -1),
        ])
        .unwrap();

        let mut reads = [
            KeyVal::u64(0, 0),
            KeyVal::bool(1, false),
            KeyVal::str(2, ""),
            KeyVal::i64(3, 0),
        ];
        tv.get_all(&mut reads).unwrap();

        assert_eq!(reads[0], KeyVal::u64(0, 42));
        assert_eq!(reads[1], KeyVal::bool(1, true));
        assert_eq!(reads[2], KeyVal::str(2, "session"));
        assert_eq!(reads[3], KeyVal::i64(3, -1));
    }

    #[test]
    fn batch_reports_first_offender() {
        let mut tv = TokenValues::new();
        let err = tv
            .set_all(&[KeyVal::u64(0, 1), KeyVal::u64(40, 2), KeyVal::u64(1, 3)])
            .unwrap_err();
        assert_eq!(err, WireError::KeyTooLarge { key: 40, max: 31 });
        // The write before the offender stuck; the one after did not run.
        assert_eq!(tv.values.len(), 1);
    }
}
