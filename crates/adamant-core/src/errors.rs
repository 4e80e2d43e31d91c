//! Error types for the token service.
//!
//! Construction errors are fatal misconfiguration. Encode errors mean the
//! caller handed over an unencodable record. Every decode error collapses to
//! "invalid token" at the HTTP boundary; middleware maps decode failures to
//! 401 and encode failures to 500 without leaking token details.

use thiserror::Error;

pub use adamant_proto::ValidationError;

/// Unified error type for token service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    // Construction errors
    /// Secret key is neither 16 bytes (AES-128-GCM) nor 32 (ChaCha20-Poly1305)
    #[error("bad secret key length: {len} bytes, want 16 or 32")]
    KeyLength {
        /// Supplied key length
        len: usize,
    },

    /// No URLs supplied, so no cookie domain can be derived
    #[error("no URLs supplied: cannot derive cookie attributes")]
    NoUrls,

    /// First URL has a scheme other than http or https
    #[error("unsupported URL scheme {scheme:?}: want http or https")]
    UnsupportedScheme {
        /// The rejected scheme
        scheme: String,
    },

    // Encode/decode errors
    /// Wire-format error from marshalling or unmarshalling
    #[error(transparent)]
    Wire(#[from] adamant_proto::WireError),

    /// Token text shorter than any valid token can be
    #[error("token too short: {len} characters, want at least {min}")]
    TokenTooShort {
        /// Received text length
        len: usize,
        /// Minimum valid token length
        min: usize,
    },

    /// Base91 text does not decode over this instance's alphabet
    #[error("invalid base91 character at byte {at}")]
    Base91 {
        /// Byte offset of the first undecodable character
        at: usize,
    },

    /// Decoded buffer shorter than nonce + minimum plaintext + tag
    #[error("sealed buffer too short: {len} bytes, want at least {min}")]
    SealedTooShort {
        /// Decoded buffer length
        len: usize,
        /// Minimum sealed length
        min: usize,
    },

    /// AEAD open failed: wrong key, tampered or truncated ciphertext
    #[error("authentication failed")]
    Crypto,

    /// Plaintext magic byte differs from this instance's
    #[error("magic byte mismatch")]
    MagicMismatch,

    /// Envelope prefix (`i:` or `Bearer i:`) missing or malformed
    #[error("token envelope missing the {expected:?} prefix")]
    BadEnvelope {
        /// The prefix that was expected
        expected: &'static str,
    },

    /// Request-context validation failed (expired token, address mismatch)
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Convenient Result type alias for token operations
pub type Result<T> = std::result::Result<T, TokenError>;
