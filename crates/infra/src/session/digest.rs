//! Form digest cache
//!
//! Every mutating REST call carries an `X-RequestDigest` anti-forgery token
//! obtained from `_api/contextinfo`. The token is valid for
//! `FormDigestTimeoutSeconds`; this cache keeps it with an absolute expiry
//! and refreshes it once `now + margin >= expiry`.
//!
//! The read-check-refresh-use sequence runs under one async mutex so the
//! token and its expiry are always replaced together.

use std::sync::Arc;

use async_trait::async_trait;
use sprest_domain::Result;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::clock::Clock;
use crate::xml;

/// Source of raw `_api/contextinfo` responses
///
/// Implemented by the request engine; tests substitute a counting stub.
#[async_trait]
pub trait ContextInfoSource: Send + Sync {
    /// POST the context-info endpoint and return the response body.
    async fn fetch_context_info(&self) -> Result<String>;
}

#[derive(Debug, Default)]
struct DigestState {
    value: Option<String>,
    /// Absolute unix seconds; meaningless while `value` is `None`
    expiry: i64,
}

impl DigestState {
    fn current(&self, now: i64, margin_secs: i64) -> Option<&str> {
        match &self.value {
            Some(value) if now.saturating_add(margin_secs) < self.expiry => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Lazily refreshed form digest
pub struct DigestCache {
    state: Mutex<DigestState>,
    clock: Arc<dyn Clock>,
    margin_secs: i64,
}

impl DigestCache {
    /// Create an empty cache; the first `get_digest` always refreshes.
    pub fn new(clock: Arc<dyn Clock>, margin_secs: i64) -> Self {
        Self { state: Mutex::new(DigestState::default()), clock, margin_secs }
    }

    /// Return a digest valid for at least `margin_secs` more seconds,
    /// refreshing it through `source` at most once.
    ///
    /// # Errors
    /// Propagates request failures from `source` and returns
    /// `SpError::Parse` when the context-info document is malformed. The
    /// cached state is left untouched on failure.
    pub async fn get_digest(&self, source: &dyn ContextInfoSource) -> Result<String> {
        let mut state = self.state.lock().await;
        let now = self.clock.unix_seconds();

        if let Some(value) = state.current(now, self.margin_secs) {
            debug!(expiry = state.expiry, now, "reusing cached form digest");
            return Ok(value.to_string());
        }

        debug!(now, expiry = state.expiry, "form digest missing or near expiry, refreshing");
        let body = source.fetch_context_info().await?;
        let info = xml::parse_context_info(&body)?;

        state.expiry = now.saturating_add(info.timeout_secs);
        state.value = Some(info.digest.clone());
        info!(timeout_secs = info.timeout_secs, expiry = state.expiry, "form digest refreshed");

        Ok(info.digest)
    }

    /// Expiry of the cached digest, or `None` when nothing is cached.
    pub async fn expiry(&self) -> Option<i64> {
        let state = self.state.lock().await;
        state.value.as_ref().map(|_| state.expiry)
    }

    /// Whether a digest has been fetched yet.
    pub async fn is_cached(&self) -> bool {
        self.state.lock().await.value.is_some()
    }

    /// Drop the cached digest so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.state.lock().await = DigestState::default();
    }
}
