//! The decoded token record.
//!
//! `TokenValues` is the logical payload of a token: an optional expiry, an
//! optional client address, and up to 31 positionally-indexed opaque byte
//! values. It is a plain mutable record; sealing it into a token string is
//! the facade's job, and a sealed token never changes.
//!
//! A `TokenValues` is not safe for concurrent mutation. Callers that share
//! one across threads clone it first.

use std::{
    net::IpAddr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::errors::ValidationError;

// Average Gregorian year, the upper bound on a plausible expiry horizon.
const SECONDS_PER_YEAR: i64 = 31_556_952;

/// Decoded form of a session token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenValues {
    /// Expiry as Unix seconds UTC; `0` means no expiry
    pub expires: i64,

    /// Client address pinned by the token, if any.
    ///
    /// IPv4-mapped IPv6 addresses are shortened to IPv4 on ingress so the
    /// wire carries 4 bytes instead of 16.
    pub address: Option<IpAddr>,

    /// Positional opaque values, each at most 255 bytes
    pub values: Vec<Vec<u8>>,
}

impl TokenValues {
    /// An empty record: no expiry, no address, no values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expiry `max_age` seconds from now. Non-positive ages leave
    /// the record without expiry.
    pub fn set_expiry_max_age(&mut self, max_age: i64) {
        if max_age > 0 {
            #[allow(clippy::cast_sign_loss)]
            self.set_expiry_at(SystemTime::now() + Duration::from_secs(max_age as u64));
        }
    }

    /// Set the expiry to an absolute point in time.
    pub fn set_expiry_at(&mut self, at: SystemTime) {
        self.expires = match at.duration_since(UNIX_EPOCH) {
            Ok(since) => since.as_secs() as i64,
            Err(_) => 0,
        };
    }

    /// The expiry as a `SystemTime`, or `None` when the record has no expiry.
    #[must_use]
    pub fn expiry_time(&self) -> Option<SystemTime> {
        if self.expires <= 0 {
            return None;
        }
        Some(UNIX_EPOCH + Duration::from_secs(self.expires.unsigned_abs()))
    }

    /// Seconds until the expiry, floored at 0. Records without expiry
    /// report 0.
    #[must_use]
    pub fn max_age(&self) -> i64 {
        if self.expires <= 0 {
            return 0;
        }
        (self.expires - unix_now()).max(0)
    }

    /// Pin the client address, shortening IPv4-mapped IPv6 to IPv4.
    pub fn set_remote_ip(&mut self, ip: IpAddr) {
        self.address = Some(canonical_ip(ip));
    }

    /// Drop the pinned address.
    pub fn clear_ip(&mut self) {
        self.address = None;
    }

    /// Whether the record pins a client address.
    #[must_use]
    pub fn has_ip(&self) -> bool {
        self.address.is_some()
    }

    /// Check the record against the request context.
    ///
    /// Passes iff the expiry is absent or within `[now, now + ~1 year]`,
    /// and the pinned address is absent or equal to `remote` (IPv4-mapped
    /// addresses compare equal to their IPv4 form).
    ///
    /// # Errors
    ///
    /// [`ValidationError::BadExpiry`] for an expired or far-future token,
    /// [`ValidationError::MissingRemote`] / [`ValidationError::IpMismatch`]
    /// for address failures.
    pub fn valid(&self, remote: Option<IpAddr>) -> Result<(), ValidationError> {
        self.valid_expiry()?;
        self.valid_ip(remote)
    }

    /// The expiry half of [`valid`](Self::valid).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BadExpiry`] when the expiry is nonzero and
    /// outside the plausible window.
    pub fn valid_expiry(&self) -> Result<(), ValidationError> {
        if self.expires == 0 {
            return Ok(());
        }
        let now = unix_now();
        if self.expires < now || self.expires > now + SECONDS_PER_YEAR {
            return Err(ValidationError::BadExpiry { unix: self.expires });
        }
        Ok(())
    }

    /// The address half of [`valid`](Self::valid).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingRemote`] when the token pins an
    /// address but none is supplied, and [`ValidationError::IpMismatch`]
    /// when the addresses differ.
    pub fn valid_ip(&self, remote: Option<IpAddr>) -> Result<(), ValidationError> {
        let Some(pinned) = self.address else {
            return Ok(()); // anonymous token, nothing to compare
        };
        let Some(remote) = remote else {
            return Err(ValidationError::MissingRemote);
        };
        if canonical_ip(pinned) != canonical_ip(remote) {
            return Err(ValidationError::IpMismatch);
        }
        Ok(())
    }
}

/// Shorten an IPv4-mapped IPv6 address to its IPv4 form.
#[must_use]
pub fn canonical_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 @ IpAddr::V4(_) => v4,
    }
}

fn unix_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(_) => 0,
    }
}
