//! AEAD sealing of the serialized token.
//!
//! The key length selects the primitive, once, at construction:
//!
//! - 16 bytes → AES-128-GCM (hardware-accelerated on mainstream servers)
//! - 32 bytes → ChaCha20-Poly1305 (fast everywhere, no AES-NI required)
//!
//! Both use a 12-byte nonce and a 16-byte tag. The sealed form is the single
//! buffer `nonce ‖ ciphertext ‖ tag`; there is no associated data. The nonce
//! comes from the caller's RNG so the construction-time minimalist encode
//! can be deterministic; runtime callers pass a cryptographic source.

use aes_gcm::{aead::Aead, Aes128Gcm, KeyInit};
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;

use crate::errors::{Result, TokenError};

/// AEAD nonce length in bytes, common to both primitives
pub const NONCE_SIZE: usize = 12;

/// AEAD authentication tag length in bytes, common to both primitives
pub const TAG_SIZE: usize = 16;

/// The per-instance AEAD primitive.
#[derive(Clone)]
pub enum Cipher {
    /// AES-128-GCM, selected by a 16-byte key
    Aes128(Aes128Gcm),
    /// ChaCha20-Poly1305, selected by a 32-byte key
    ChaCha(ChaCha20Poly1305),
}

impl Cipher {
    /// Build the AEAD for a secret key.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyLength`] for any length other than 16 or 32.
    pub fn new(secret_key: &[u8]) -> Result<Self> {
        match secret_key.len() {
            16 => Ok(Self::Aes128(
                Aes128Gcm::new_from_slice(secret_key)
                    .map_err(|_| TokenError::KeyLength { len: secret_key.len() })?,
            )),
            32 => Ok(Self::ChaCha(
                ChaCha20Poly1305::new_from_slice(secret_key)
                    .map_err(|_| TokenError::KeyLength { len: secret_key.len() })?,
            )),
            len => Err(TokenError::KeyLength { len }),
        }
    }

    /// Seal a plaintext as `nonce ‖ ciphertext ‖ tag`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Crypto`] if the underlying AEAD rejects the
    /// input (in practice only for absurd lengths).
    pub fn seal<R: RngCore>(&self, plaintext: &[u8], rng: &mut R) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut nonce);

        let ciphertext = match self {
            Self::Aes128(aead) => aead.encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext),
            Self::ChaCha(aead) => {
                aead.encrypt(chacha20poly1305::Nonce::from_slice(&nonce), plaintext)
            },
        }
        .map_err(|_| TokenError::Crypto)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a `nonce ‖ ciphertext ‖ tag` buffer.
    ///
    /// The caller must have checked the minimum length; this splits the
    /// nonce and authenticates the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Crypto`] on any authentication failure: wrong
    /// key, flipped bit, truncation.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(TokenError::SealedTooShort {
                len: sealed.len(),
                min: NONCE_SIZE + TAG_SIZE,
            });
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

        match self {
            Self::Aes128(aead) => aead.decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext),
            Self::ChaCha(aead) => {
                aead.decrypt(chacha20poly1305::Nonce::from_slice(nonce), ciphertext)
            },
        }
        .map_err(|_| TokenError::Crypto)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        match self {
            Self::Aes128(_) => f.write_str("Cipher::Aes128Gcm"),
            Self::ChaCha(_) => f.write_str("Cipher::ChaCha20Poly1305"),
        }
    }
}
