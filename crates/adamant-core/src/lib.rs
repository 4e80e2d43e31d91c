//! # Adamant: authenticated stateless session tokens
//!
//! This crate seals a small structured record — an optional expiry, an
//! optional client address, up to 31 positional byte values — into a short
//! printable string fit for a cookie or an `Authorization` bearer header,
//! and detects any tampering on the server that issued it.
//!
//! ## Pipeline
//!
//! ```text
//! TokenValues ──marshal──▶ bytes ──[snappy]──▶ AEAD seal ──▶ Base91 ──▶ "i:…"
//! ```
//!
//! The wire format lives in `adamant-proto`; this crate adds the AEAD stage
//! (AES-128-GCM for 16-byte keys, ChaCha20-Poly1305 for 32-byte keys), the
//! cookie-safe Base91 text codec over a key-shuffled alphabet, the cookie
//! template, and the [`Adamant`] facade tying them together.
//!
//! ## Trust model
//!
//! One trust domain owns the secret key; whoever holds it can mint and read
//! tokens. There is no key agreement, rotation, refresh or revocation. The
//! magic byte and the shuffled alphabet partition instances and shed foreign
//! tokens cheaply; they are not security boundaries.
//!
//! ## Quick start
//!
//! ```
//! use adamant_core::{Adamant, KeyVal, TokenValues};
//! use url::Url;
//!
//! let urls = [Url::parse("http://localhost:8080/").unwrap()];
//! let service = Adamant::new(&urls, &[42u8; 16], "", 0, false).unwrap();
//!
//! let tv = TokenValues::with(&[KeyVal::u64(0, 7), KeyVal::str(1, "admin")]).unwrap();
//! let token = service.encode(&tv).unwrap();
//! assert_eq!(service.decode(&token).unwrap(), tv);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod base91;
pub mod cipher;
pub mod errors;
pub mod service;
mod template;

pub use adamant_proto::{KeyVal, TokenValues, ValidationError, WireError};
pub use base91::Base91;
pub use cipher::Cipher;
pub use errors::{Result, TokenError};
pub use service::{Adamant, BEARER_SCHEME, MIN_TOKEN_LEN, TOKEN_SCHEME};
