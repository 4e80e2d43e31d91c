//! Cookie template derivation.
//!
//! The template is computed once from the service's canonical URL and reused
//! for every `Set-Cookie`: scheme selects the `Secure` flag, the hostname
//! becomes `Domain`, the cleaned path becomes `Path`, and an unnamed cookie
//! takes its name from the last path segment (falling back to `"session"`).
//! Secure cookies without an explicit `_`-prefixed name get the `__Host-` or
//! `__Secure-` prefix so browsers enforce their scoping rules.

use cookie::{time::Duration, Cookie, SameSite};
use url::Url;

use crate::errors::{Result, TokenError};

const DEFAULT_NAME: &str = "session";

/// Immutable cookie attributes shared by every token cookie of an instance.
#[derive(Debug, Clone)]
pub(crate) struct CookieTemplate {
    pub(crate) name: String,
    path: String,
    domain: Option<String>,
    secure: bool,
    max_age: i64,
}

impl CookieTemplate {
    /// Derive the template from the canonical URL.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::UnsupportedScheme`] for anything other than
    /// `http` or `https`.
    pub(crate) fn derive(url: &Url, name: &str, max_age: i64) -> Result<Self> {
        let secure = match url.scheme() {
            "http" => false,
            "https" => true,
            scheme => {
                return Err(TokenError::UnsupportedScheme { scheme: scheme.to_owned() })
            },
        };

        let path = clean_path(url.path());
        let domain = match url.host_str() {
            Some(host) if !host.is_empty() => Some(host.to_owned()),
            _ => None,
        };

        let mut name = if name.is_empty() {
            path.rsplit('/').find(|seg| !seg.is_empty()).unwrap_or(DEFAULT_NAME).to_owned()
        } else {
            name.to_owned()
        };

        if secure && !name.starts_with('_') {
            let host_scoped = path == "/" && domain.is_none();
            name = format!("{}{name}", if host_scoped { "__Host-" } else { "__Secure-" });
        }

        Ok(Self { name, path, domain, secure, max_age })
    }

    /// A cookie carrying `value`, with the template's attributes.
    pub(crate) fn cookie(&self, value: String) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), value))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(true)
            .same_site(SameSite::Strict);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if self.max_age > 0 {
            builder = builder.max_age(Duration::seconds(self.max_age));
        }

        builder.build()
    }

    /// The removal cookie: empty value, expiry in the past.
    pub(crate) fn dead(&self) -> Cookie<'static> {
        let mut cookie = self.cookie(String::new());
        cookie.make_removal();
        cookie
    }
}

/// Resolve `.` and `..` segments and drop the trailing slash (except root).
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            seg => segments.push(seg),
        }
    }

    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}", segments.join("/"))
    }
}
