//! The token service facade.
//!
//! An [`Adamant`] instance is built once from a secret key and a canonical
//! URL, then shared freely: it is immutable after construction and every
//! operation is pure with respect to instance state, so `&Adamant` is safe
//! across threads without synchronization.
//!
//! Encode pipeline: marshal → AEAD seal → Base91. Decode runs it backwards,
//! with a byte-equality fast path for the precomputed minimalist token and a
//! cheap length gate before any crypto.
//!
//! Key-derived state (the magic byte, the alphabet permutation, the
//! minimalist token) comes from a PRNG seeded deterministically from the
//! secret key, so two instances with equal keys interoperate down to the
//! literal minimalist string. The deterministic PRNG is abandoned right
//! after construction; runtime nonces come from the OS.

use std::net::IpAddr;

use cookie::Cookie;
use rand::{rngs::OsRng, rngs::SmallRng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use url::Url;

use adamant_proto::{magic_code, marshal, unmarshal, TokenValues, MIN_PLAINTEXT_SIZE};

use crate::{
    base91::Base91,
    cipher::{Cipher, NONCE_SIZE, TAG_SIZE},
    errors::{Result, TokenError, ValidationError},
    template::CookieTemplate,
};

/// Scheme prefix of a token inside a cookie value (RFC 8959 style)
pub const TOKEN_SCHEME: &str = "i:";

/// Full prefix of a token inside an `Authorization` header
pub const BEARER_SCHEME: &str = "Bearer i:";

/// Shortest text a valid token can render to.
///
/// The smallest sealed buffer is 34 bytes (12-byte nonce, 6-byte plaintext,
/// 16-byte tag), which basE91 renders as 42 characters outside a vanishingly
/// small corner of input space. Anything shorter is rejected before the
/// Base91 and AEAD stages run.
pub const MIN_TOKEN_LEN: usize = 42;

const MIN_SEALED_SIZE: usize = NONCE_SIZE + MIN_PLAINTEXT_SIZE + TAG_SIZE;

/// A stateless session-token service.
///
/// Construction derives everything from the configuration; afterwards the
/// instance only reads its own fields and the system RNG.
pub struct Adamant {
    cipher: Cipher,
    magic: u8,
    base91: Base91,
    template: CookieTemplate,
    max_age: i64,
    require_ip: bool,
    dev_mode: bool,
    /// Canonical encode of the empty record, without the scheme prefix
    minimalist: String,
    /// Template cookie, carrying the minimalist token when the fast-path
    /// configuration (no IP pinning, non-positive max-age) allows it
    cookie: Cookie<'static>,
}

impl Adamant {
    /// Build a token service.
    ///
    /// The first URL is canonical: it selects the cookie's `Secure` flag,
    /// `Domain`, `Path` and (when `cookie_name` is empty) its name, and
    /// `http://localhost` turns on dev mode for the collaborating
    /// middleware.
    ///
    /// # Errors
    ///
    /// [`TokenError::NoUrls`], [`TokenError::KeyLength`] and
    /// [`TokenError::UnsupportedScheme`] are fatal misconfiguration.
    pub fn new(
        urls: &[Url],
        secret_key: &[u8],
        cookie_name: &str,
        max_age: i64,
        require_ip: bool,
    ) -> Result<Self> {
        let canonical = urls.first().ok_or(TokenError::NoUrls)?;

        let cipher = Cipher::new(secret_key)?;

        // Deterministic window: everything drawn from this PRNG is a pure
        // function of the secret key, minimalist token included.
        let mut seeded = ChaCha8Rng::from_seed(seed_from_key(secret_key));
        let magic = seeded.gen::<u8>();
        let base91 = Base91::shuffled(&mut seeded);

        let template = CookieTemplate::derive(canonical, cookie_name, max_age)?;

        let dev_mode = canonical.scheme() == "http" && canonical.host_str() == Some("localhost");
        if dev_mode {
            info!(url = %canonical, "dev mode: missing or invalid tokens are tolerated");
        } else {
            info!(cookie = %template.name, "prod mode: a valid token is required");
        }

        let empty = TokenValues::new();
        let plaintext = marshal(&empty, magic, &mut seeded)?;
        let sealed = cipher.seal(&plaintext, &mut seeded)?;
        let minimalist = base91.encode(&sealed);

        let fast_path = !require_ip && max_age <= 0;
        let cookie = template.cookie(if fast_path {
            format!("{TOKEN_SCHEME}{minimalist}")
        } else {
            String::new()
        });

        Ok(Self {
            cipher,
            magic,
            base91,
            template,
            max_age,
            require_ip,
            dev_mode,
            minimalist,
            cookie,
        })
    }

    /// Seal a record into its Base91 text (no scheme prefix).
    ///
    /// # Errors
    ///
    /// Surfaces the wire-format input errors: too many values, an oversized
    /// value, an out-of-window expiry.
    pub fn encode(&self, tv: &TokenValues) -> Result<String> {
        // Salt byte and compression coin take a cheap generator; only the
        // nonce needs the OS entropy pool.
        let plaintext = marshal(tv, self.magic, &mut SmallRng::from_entropy())?;
        let sealed = self.cipher.seal(&plaintext, &mut OsRng)?;
        Ok(self.base91.encode(&sealed))
    }

    /// Open a Base91 token text back into a record.
    ///
    /// # Errors
    ///
    /// Every failure means "invalid token": a too-short text, an alphabet
    /// miss, an authentication failure, a foreign magic byte, or a
    /// malformed plaintext.
    pub fn decode(&self, token: &str) -> Result<TokenValues> {
        if self.is_minimalist(token) {
            return Ok(TokenValues::new());
        }

        if token.len() < MIN_TOKEN_LEN {
            return Err(TokenError::TokenTooShort { len: token.len(), min: MIN_TOKEN_LEN });
        }

        let sealed = self.base91.decode(token)?;
        if sealed.len() < MIN_SEALED_SIZE {
            return Err(TokenError::SealedTooShort { len: sealed.len(), min: MIN_SEALED_SIZE });
        }

        let plaintext = self.cipher.open(&sealed)?;

        if magic_code(&plaintext) != self.magic {
            debug!("token authenticated but carries a foreign magic byte");
            return Err(TokenError::MagicMismatch);
        }

        Ok(unmarshal(&plaintext)?)
    }

    /// A fresh record carrying this instance's expiry policy and, when IP
    /// pinning is on, the request's remote address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingRemote`] when pinning is required
    /// but no remote address is available.
    pub fn new_token_values(&self, remote: Option<IpAddr>) -> Result<TokenValues> {
        let mut tv = TokenValues::new();
        if self.max_age > 0 {
            tv.set_expiry_max_age(self.max_age);
        }
        if self.require_ip {
            let ip = remote.ok_or(ValidationError::MissingRemote)?;
            tv.set_remote_ip(ip);
        }
        Ok(tv)
    }

    /// Seal a record and wrap it in a `Set-Cookie` ready cookie.
    ///
    /// # Errors
    ///
    /// Same conditions as [`encode`](Self::encode).
    pub fn new_cookie(&self, tv: &TokenValues) -> Result<Cookie<'static>> {
        let token = self.encode(tv)?;
        Ok(self.template.cookie(format!("{TOKEN_SCHEME}{token}")))
    }

    /// The precomputed template cookie.
    ///
    /// Carries the minimalist token when the configuration allows the fast
    /// path; middleware hands it out to anonymous clients without touching
    /// the cipher.
    #[must_use]
    pub fn cookie(&self) -> &Cookie<'static> {
        &self.cookie
    }

    /// The logout cookie: empty value and an expiry in the past, which
    /// instructs the browser to drop the session.
    #[must_use]
    pub fn dead_cookie(&self) -> Cookie<'static> {
        self.template.dead()
    }

    /// Seal a record as an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Same conditions as [`encode`](Self::encode).
    pub fn bearer(&self, tv: &TokenValues) -> Result<String> {
        Ok(format!("{BEARER_SCHEME}{}", self.encode(tv)?))
    }

    /// Extract the token text from a cookie value (`i:<base91>`).
    ///
    /// # Errors
    ///
    /// [`TokenError::BadEnvelope`] without the exact prefix,
    /// [`TokenError::TokenTooShort`] below the minimum length.
    pub fn cookie_token<'a>(&self, value: &'a str) -> Result<&'a str> {
        strip_scheme(value, TOKEN_SCHEME)
    }

    /// Extract the token text from an `Authorization` header
    /// (`Bearer i:<base91>`).
    ///
    /// # Errors
    ///
    /// Same conditions as [`cookie_token`](Self::cookie_token).
    pub fn bearer_token<'a>(&self, header: &'a str) -> Result<&'a str> {
        strip_scheme(header, BEARER_SCHEME)
    }

    /// Whether `token` is byte-identical to the minimalist token.
    #[must_use]
    pub fn is_minimalist(&self, token: &str) -> bool {
        token == self.minimalist
    }

    /// The canonical encode of the empty record (no scheme prefix).
    #[must_use]
    pub fn minimalist(&self) -> &str {
        &self.minimalist
    }

    /// Whether requests without a valid token are tolerated (first URL was
    /// `http://localhost`).
    #[must_use]
    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// The cookie name this instance reads and writes.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.template.name
    }

    /// This instance's magic byte (first plaintext byte of every token).
    #[must_use]
    pub fn magic(&self) -> u8 {
        self.magic
    }
}

impl std::fmt::Debug for Adamant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adamant")
            .field("cipher", &self.cipher)
            .field("cookie", &self.template.name)
            .field("max_age", &self.max_age)
            .field("require_ip", &self.require_ip)
            .field("dev_mode", &self.dev_mode)
            .finish_non_exhaustive()
    }
}

/// Stretch the 16- or 32-byte secret into the PRNG's 32-byte seed.
fn seed_from_key(secret_key: &[u8]) -> [u8; 32] {
    let mut seed = [0u8; 32];
    for (dst, src) in seed.iter_mut().zip(secret_key.iter().cycle()) {
        *dst = *src;
    }
    seed
}

fn strip_scheme<'a>(text: &'a str, scheme: &'static str) -> Result<&'a str> {
    let token = text
        .strip_prefix(scheme)
        .ok_or(TokenError::BadEnvelope { expected: scheme })?;
    if token.len() < MIN_TOKEN_LEN {
        return Err(TokenError::TokenTooShort { len: token.len(), min: MIN_TOKEN_LEN });
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localhost() -> Vec<Url> {
        vec![Url::parse("http://localhost:8080/").unwrap()]
    }

    fn service() -> Adamant {
        Adamant::new(&localhost(), &[9u8; 16], "", 0, false).unwrap()
    }

    #[test]
    fn construction_requires_urls() {
        assert_eq!(
            Adamant::new(&[], &[9u8; 16], "", 0, false).unwrap_err(),
            TokenError::NoUrls
        );
    }

    #[test]
    fn construction_requires_sane_key() {
        assert_eq!(
            Adamant::new(&localhost(), &[9u8; 20], "", 0, false).unwrap_err(),
            TokenError::KeyLength { len: 20 }
        );
    }

    #[test]
    fn localhost_http_is_dev_mode() {
        assert!(service().dev_mode());

        let prod =
            Adamant::new(&[Url::parse("https://example.com/").unwrap()], &[9u8; 16], "", 0, false)
                .unwrap();
        assert!(!prod.dev_mode());
    }

    #[test]
    fn same_key_derives_same_instance_identity() {
        let a = service();
        let b = service();
        assert_eq!(a.magic(), b.magic());
        assert_eq!(a.minimalist(), b.minimalist());
        assert_eq!(a.cookie().value(), b.cookie().value());
    }

    #[test]
    fn different_keys_derive_different_identities() {
        let a = Adamant::new(&localhost(), &[1u8; 16], "", 0, false).unwrap();
        let b = Adamant::new(&localhost(), &[2u8; 16], "", 0, false).unwrap();
        assert_ne!(a.minimalist(), b.minimalist());
    }

    #[test]
    fn minimalist_fast_path_skips_crypto() {
        let svc = service();
        let tv = svc.decode(svc.minimalist()).unwrap();
        assert_eq!(tv, TokenValues::new());
    }

    #[test]
    fn fast_path_cookie_carries_minimalist() {
        let svc = service();
        assert_eq!(svc.cookie().value(), format!("i:{}", svc.minimalist()));

        // IP pinning disables the precomputed value.
        let pinned = Adamant::new(&localhost(), &[9u8; 16], "", 0, true).unwrap();
        assert_eq!(pinned.cookie().value(), "");
    }

    #[test]
    fn short_text_is_rejected_before_crypto() {
        let svc = service();
        let err = svc.decode("i-am-way-too-short").unwrap_err();
        assert_eq!(err, TokenError::TokenTooShort { len: 18, min: MIN_TOKEN_LEN });
    }

    #[test]
    fn envelope_stripping() {
        let svc = service();
        let token = svc.encode(&TokenValues::new()).unwrap();

        let cookie_value = format!("i:{token}");
        assert_eq!(svc.cookie_token(&cookie_value).unwrap(), token);

        let header = format!("Bearer i:{token}");
        assert_eq!(svc.bearer_token(&header).unwrap(), token);

        assert_eq!(
            svc.cookie_token(&token).unwrap_err(),
            TokenError::BadEnvelope { expected: TOKEN_SCHEME }
        );
        assert_eq!(
            svc.bearer_token("Basic dXNlcjpwYXNz").unwrap_err(),
            TokenError::BadEnvelope { expected: BEARER_SCHEME }
        );
        assert!(matches!(
            svc.cookie_token("i:short").unwrap_err(),
            TokenError::TokenTooShort { .. }
        ));
    }

    #[test]
    fn new_token_values_honors_configuration() {
        let anon = service().new_token_values(None).unwrap();
        assert_eq!(anon, TokenValues::new());

        let pinning = Adamant::new(&localhost(), &[9u8; 16], "", 3600, true).unwrap();
        let remote = "203.0.113.7".parse().unwrap();
        let tv = pinning.new_token_values(Some(remote)).unwrap();
        assert_eq!(tv.address, Some(remote));
        assert!(tv.max_age() > 3590);

        assert_eq!(
            pinning.new_token_values(None).unwrap_err(),
            TokenError::Validation(ValidationError::MissingRemote)
        );
    }

    #[test]
    fn service_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Adamant>();
    }
}
