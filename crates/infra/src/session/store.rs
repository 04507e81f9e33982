//! Session state for one authenticated client
//!
//! Holds the cookie jar produced by the claims sign-in and the form digest
//! cache. The jar is installed exactly once; everything else reads it.

use std::sync::{Arc, OnceLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use sprest_domain::{Result, SpError};
use url::Url;

use super::clock::Clock;
use super::digest::DigestCache;

/// Credential/session store owned by a single client instance
pub struct Session {
    cookies: OnceLock<Arc<Jar>>,
    digest: DigestCache,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new(clock: Arc<dyn Clock>, digest_margin_secs: i64) -> Self {
        Self { cookies: OnceLock::new(), digest: DigestCache::new(clock, digest_margin_secs) }
    }

    /// Install the cookie jar captured during sign-in.
    ///
    /// # Errors
    /// Returns `SpError::Authentication` if the session already holds a jar.
    pub fn install_cookies(&self, jar: Arc<Jar>) -> Result<()> {
        self.cookies
            .set(jar)
            .map_err(|_| SpError::Authentication("session is already authenticated".into()))
    }

    /// The session cookie jar, once authentication has completed.
    pub fn cookie_jar(&self) -> Option<&Arc<Jar>> {
        self.cookies.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.cookies.get().is_some()
    }

    /// `Cookie` header value the session would send to `url`.
    pub fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        self.cookies.get().and_then(|jar| jar.cookies(url))
    }

    pub fn digest(&self) -> &DigestCache {
        &self.digest
    }
}
