//! Client configuration
//!
//! `ClientConfig` describes one authenticated session: which tenant host
//! and site to talk to, whose credentials to present, and the deadlines
//! applied to every exchange. Loading from the environment or from files
//! lives in `sprest_infra::config`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_IDENTITY_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TRANSFER_TIMEOUT_SECS,
    DIGEST_REFRESH_MARGIN_SECS, TRANSFER_CHUNK_SIZE,
};
use crate::errors::{Result, SpError};

/// Configuration for a single SharePoint session
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Tenant host, e.g. `https://contoso.sharepoint.com` (no trailing slash)
    pub host: String,
    /// Server-relative site path with leading and trailing slash, e.g.
    /// `/sites/dev/`
    pub site: String,
    /// Account name presented to the identity provider
    pub username: String,
    /// Account password; never serialized or printed
    #[serde(skip_serializing, default)]
    pub password: String,
    /// WS-Trust security token service endpoint
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    /// Deadline for ordinary requests, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Deadline for file uploads and downloads
    #[serde(default = "default_transfer_timeout_secs")]
    pub transfer_timeout_secs: u64,
    /// Refresh the form digest once it is this close to expiry, in seconds
    #[serde(default = "default_digest_refresh_margin_secs")]
    pub digest_refresh_margin_secs: i64,
    /// Chunk size for streamed uploads and downloads, in bytes
    #[serde(default = "default_transfer_chunk_size")]
    pub transfer_chunk_size: usize,
    /// `User-Agent` header; reqwest's default when unset
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_identity_url() -> String {
    DEFAULT_IDENTITY_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_transfer_timeout_secs() -> u64 {
    DEFAULT_TRANSFER_TIMEOUT_SECS
}

fn default_digest_refresh_margin_secs() -> i64 {
    DIGEST_REFRESH_MARGIN_SECS
}

fn default_transfer_chunk_size() -> usize {
    TRANSFER_CHUNK_SIZE
}

impl ClientConfig {
    /// Create a configuration with default deadlines and identity endpoint.
    pub fn new(
        host: impl Into<String>,
        site: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            site: site.into(),
            username: username.into(),
            password: password.into(),
            identity_url: default_identity_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            transfer_timeout_secs: DEFAULT_TRANSFER_TIMEOUT_SECS,
            digest_refresh_margin_secs: DIGEST_REFRESH_MARGIN_SECS,
            transfer_chunk_size: TRANSFER_CHUNK_SIZE,
            user_agent: None,
        }
    }

    /// Override the security token service endpoint.
    #[must_use]
    pub fn with_identity_url(mut self, url: impl Into<String>) -> Self {
        self.identity_url = url.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    /// `host + site`, the prefix every REST endpoint is built on.
    pub fn site_url(&self) -> String {
        format!("{}{}", self.host, self.site)
    }

    /// Check structural invariants of the configuration.
    ///
    /// # Errors
    /// Returns `SpError::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if !is_http_url(&self.host) {
            return Err(SpError::Config(format!(
                "host must be an absolute http(s) URL, got '{}'",
                self.host
            )));
        }
        if self.host.ends_with('/') {
            return Err(SpError::Config("host must not end with '/'".into()));
        }
        if !self.site.starts_with('/') || !self.site.ends_with('/') {
            return Err(SpError::Config(format!(
                "site must start and end with '/', got '{}'",
                self.site
            )));
        }
        if self.username.trim().is_empty() {
            return Err(SpError::Config("username must not be empty".into()));
        }
        if !is_http_url(&self.identity_url) {
            return Err(SpError::Config(format!(
                "identity_url must be an absolute http(s) URL, got '{}'",
                self.identity_url
            )));
        }
        if self.transfer_chunk_size == 0 {
            return Err(SpError::Config("transfer_chunk_size must be greater than zero".into()));
        }
        if self.digest_refresh_margin_secs < 0 {
            return Err(SpError::Config("digest_refresh_margin_secs must not be negative".into()));
        }
        if self.request_timeout_secs == 0 || self.transfer_timeout_secs == 0 {
            return Err(SpError::Config("timeouts must be greater than zero".into()));
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value.strip_prefix("https://").or_else(|| value.strip_prefix("http://"));
    rest.is_some_and(|host| !host.is_empty())
}

// Credentials stay out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("site", &self.site)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("identity_url", &self.identity_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("transfer_timeout_secs", &self.transfer_timeout_secs)
            .field("digest_refresh_margin_secs", &self.digest_refresh_margin_secs)
            .field("transfer_chunk_size", &self.transfer_chunk_size)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
