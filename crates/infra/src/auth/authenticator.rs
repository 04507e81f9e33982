use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use sprest_domain::constants::{SIGN_IN_PATH, SOAP_CONTENT_TYPE};
use sprest_domain::{ClientConfig, Result, SpError};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::envelope::security_token_request;
use crate::engine::{RequestDescriptor, RequestEngine};
use crate::xml::find_element_text;

const MISSING_TOKEN: &str = "identity provider response has no wsse:BinarySecurityToken";

/// Claims-based sign-in against a SharePoint Online host
///
/// Runs the two-step handshake: a WS-Trust token request to the identity
/// provider, then a form sign-in on the target host that answers with the
/// session cookies (`FedAuth`, `rtFa`).
#[derive(Debug, Clone)]
pub struct Authenticator {
    identity_url: String,
    host: String,
}

impl Authenticator {
    /// Create an authenticator
    ///
    /// # Arguments
    ///
    /// * `identity_url` - WS-Trust security token service endpoint
    /// * `host` - Target host, e.g. `https://contoso.sharepoint.com`
    pub fn new(identity_url: impl Into<String>, host: impl Into<String>) -> Self {
        Self { identity_url: identity_url.into(), host: host.into() }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.identity_url.clone(), config.host.clone())
    }

    /// Run the handshake and return the populated cookie jar
    ///
    /// No retries: the first failure aborts.
    ///
    /// # Errors
    ///
    /// Returns `SpError::Authentication` if the identity provider refuses
    /// the credentials, omits the security token, or the sign-in yields no
    /// cookies. Cancellation and deadline errors pass through unchanged.
    #[instrument(skip(self, engine, password), fields(host = %self.host))]
    pub async fn authenticate(
        &self,
        engine: &RequestEngine,
        username: &str,
        password: &str,
    ) -> Result<Arc<Jar>> {
        let token = self.request_security_token(engine, username, password).await?;
        let jar = self.sign_in(engine, &token).await?;
        info!("claims sign-in complete");
        Ok(Arc::new(jar))
    }

    async fn request_security_token(
        &self,
        engine: &RequestEngine,
        username: &str,
        password: &str,
    ) -> Result<String> {
        debug!(identity_url = %self.identity_url, "requesting security token");
        let envelope = security_token_request(&self.identity_url, &self.host, username, password);
        let descriptor = RequestDescriptor::post(self.identity_url.as_str())
            .body_text(envelope, Some(SOAP_CONTENT_TYPE));

        let response = engine
            .execute_detached(descriptor, None)
            .await
            .map_err(|err| authentication_failure("security token request", err))?
            .into_text();

        let token = find_element_text(&response, "BinarySecurityToken")
            .map_err(|err| authentication_failure("security token response", err))?;

        match token {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Some(_) => Err(SpError::Authentication(
                "identity provider returned an empty wsse:BinarySecurityToken".into(),
            )),
            None => {
                warn!("identity provider issued no security token");
                Err(SpError::Authentication(MISSING_TOKEN.into()))
            }
        }
    }

    async fn sign_in(&self, engine: &RequestEngine, token: &str) -> Result<Jar> {
        let sign_in_url = format!("{}{}", self.host, SIGN_IN_PATH);
        debug!("posting security token to form sign-in");

        let jar = Jar::default();
        let descriptor =
            RequestDescriptor::post(sign_in_url).body_text(token, None).allow_redirect().ignore_response();
        engine
            .execute_detached(descriptor, Some(&jar))
            .await
            .map_err(|err| authentication_failure("form sign-in", err))?;

        let host_url = Url::parse(&self.host)
            .map_err(|err| SpError::Authentication(format!("invalid host {}: {err}", self.host)))?;
        if jar.cookies(&host_url).is_none() {
            return Err(SpError::Authentication("form sign-in returned no session cookies".into()));
        }
        Ok(jar)
    }
}

/// Fold request and parse failures of the handshake into authentication
/// failures. Cancellation and deadlines keep their own variants.
fn authentication_failure(step: &str, err: SpError) -> SpError {
    match err {
        SpError::Cancelled | SpError::Timeout(_) | SpError::Authentication(_) => err,
        other => {
            warn!(step, error = %other, "authentication step failed");
            SpError::Authentication(format!("{step} failed: {other}"))
        }
    }
}
