//! # Adamant Protocol: Wire Format
//!
//! This crate implements the binary layer of the adamant session-token
//! system: the compact plaintext a token service seals into a cookie or
//! bearer value.
//!
//! ## Wire Layout
//!
//! All multi-byte integers are little-endian:
//!
//! ```text
//! offset 0  : magic     (1 byte, per-instance)
//! offset 1  : salt      (1 byte, random per encode)
//! offset 2  : metadata  (1 byte, bit-packed; see `metadata`)
//! offset 3  : expiry    (3 bytes, 20-second precision from 2022)
//! offset …  : address   (0, 4 or 16 bytes per metadata)
//! offset …  : n values, each: len(1) ‖ data(len)
//! ```
//!
//! The post-header payload may be Snappy-compressed (metadata bit 5), with a
//! partially-randomized trigger so ciphertext lengths do not form a clean
//! oracle over chosen plaintexts.
//!
//! ## Implementation Notes
//!
//! - **Caller-supplied randomness**: `marshal` draws the salt byte and the
//!   compression coin from the caller's RNG. Production callers hand it a
//!   cheap generator; tests and the deterministic minimalist-token encode
//!   hand it a seeded one.
//!
//! - **Explicit validation**: every length claim in an incoming buffer is
//!   checked before use and violations surface as structured [`WireError`]
//!   values. There are no unchecked fast paths.
//!
//! - **Positional slots**: values are addressed by index, not by name, to
//!   keep both the wire bytes and the hot path small. The typed accessors in
//!   `getset` layer u64/i64/bool/str views over the raw slots.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod expiry;
pub mod getset;
pub mod marshal;
pub mod metadata;
pub mod padding;
pub mod uint;
pub mod unmarshal;
pub mod values;

pub use errors::{Result, ValidationError, WireError};
pub use getset::KeyVal;
pub use marshal::marshal;
pub use metadata::{magic_code, Metadata, HEADER_SIZE, MAX_VALUES};
pub use unmarshal::{unmarshal, MIN_PLAINTEXT_SIZE};
pub use values::TokenValues;
