//! Error types for the adamant wire format.
//!
//! All errors are structured, testable, and carry the sizes or indexes that
//! triggered them. Encode-side errors are caller bugs (oversized input);
//! decode-side errors mean the buffer is not a well-formed token plaintext.

use thiserror::Error;

/// Wire-format errors raised while marshalling or unmarshalling a token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    // Encode-side input errors
    /// More positional values than the metadata byte can describe
    #[error("too many values: {count} exceeds maximum {max}")]
    TooManyValues {
        /// Number of values supplied
        count: usize,
        /// Maximum the 5-bit count field can hold
        max: usize,
    },

    /// A single value does not fit its 1-byte length prefix
    #[error("value #{index} too large: {len} bytes exceeds maximum {max}")]
    ValueTooLarge {
        /// Position of the offending value
        index: usize,
        /// Actual length in bytes
        len: usize,
        /// Maximum encodable length
        max: usize,
    },

    /// Expiry falls outside the representable window
    #[error("expiry out of range: unix time {unix} not within the token window")]
    ExpiryOutOfRange {
        /// The rejected Unix time in seconds
        unix: i64,
    },

    /// Address is neither absent, IPv4 (4 bytes) nor IPv6 (16 bytes)
    #[error("bad address length: {len} bytes, want 0, 4 or 16")]
    BadAddressLength {
        /// Actual address length
        len: usize,
    },

    /// Assembled buffer length disagrees with the serializer's accounting
    #[error("length mismatch: assembled {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// Expected buffer length
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// Snappy compression failed
    #[error("compress: {0}")]
    Compress(String),

    // Decode-side format errors
    /// Buffer is shorter than the fixed header plus expiry field
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum size of any token plaintext
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// Post-decompression payload is shorter than the metadata byte implies
    #[error("payload too short: {actual} bytes, metadata implies at least {expected}")]
    PayloadTooShort {
        /// Minimum payload size derived from metadata
        expected: usize,
        /// Actual payload size
        actual: usize,
    },

    /// A value record claims more bytes than remain in the buffer
    #[error("value #{index} truncated: only {available} bytes remain")]
    ValueTruncated {
        /// Position of the truncated value
        index: usize,
        /// Bytes remaining in the buffer
        available: usize,
    },

    /// Bytes remain after the last declared value
    #[error("unexpected trailing bytes: {count}")]
    TrailingBytes {
        /// Number of surplus bytes
        count: usize,
    },

    /// Padding trailer claims more padding than the format allows
    #[error("padding too large: {len} bytes exceeds maximum {max}")]
    PaddingTooLarge {
        /// Claimed padding length
        len: usize,
        /// Maximum padding length
        max: usize,
    },

    /// Snappy decompression failed
    #[error("decompress: {0}")]
    Decompress(String),

    /// An integer slot holds more bytes than a u64 can carry
    #[error("uint too wide: {len} bytes, want at most 8")]
    UintTooWide {
        /// Actual slot length
        len: usize,
    },

    // Accessor errors
    /// Read of a slot past the populated range
    #[error("key {key} out of range: {len} values present")]
    KeyOutOfRange {
        /// Requested slot index
        key: usize,
        /// Number of populated slots
        len: usize,
    },

    /// Write to a slot past the addressable range
    #[error("key {key} exceeds maximum slot index {max}")]
    KeyTooLarge {
        /// Requested slot index
        key: usize,
        /// Largest addressable slot index
        max: usize,
    },

    /// A boolean slot longer than one byte
    #[error("bool slot holds {len} bytes, want 0 or 1")]
    NotBoolean {
        /// Actual slot length
        len: usize,
    },

    /// A string slot that is not valid UTF-8
    #[error("slot {key} is not valid UTF-8")]
    InvalidUtf8 {
        /// Offending slot index
        key: usize,
    },
}

/// Request-context validation errors raised by
/// [`TokenValues::valid`](crate::TokenValues::valid).
///
/// These are "unauthenticated" conditions, distinct from wire-format errors:
/// the token decoded fine but does not authorize this request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Expiry in the past, or implausibly far in the future
    #[error("token expired or dated in the far future: unix {unix}")]
    BadExpiry {
        /// The token's Unix expiry in seconds
        unix: i64,
    },

    /// Token pins a client address but the request comes from another
    #[error("token address does not match the request address")]
    IpMismatch,

    /// Token pins a client address but the request carries none
    #[error("token pins an address but the request has no remote address")]
    MissingRemote,
}

/// Convenient Result type alias for wire operations
pub type Result<T> = std::result::Result<T, WireError>;
