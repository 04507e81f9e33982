use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use sprest_domain::{Result, SpError};
use tracing::debug;
use url::Url;

use crate::errors::IntoSpError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport used by the request engine.
///
/// Redirects are never followed and connections are never reused. Two
/// underlying clients share the configuration: one transparently decodes
/// gzip/deflate bodies (used when a request asks for compression), the
/// other leaves `Accept-Encoding` entirely to the caller.
#[derive(Clone)]
pub struct HttpClient {
    plain: ReqwestClient,
    compressed: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder on the client matching `compressed`.
    pub fn request(&self, method: Method, url: Url, compressed: bool) -> RequestBuilder {
        let client = if compressed { &self.compressed } else { &self.plain };
        client.request(method, url)
    }

    /// Execute the provided request builder once. No retries.
    ///
    /// Any status code is returned as a response; only transport failures
    /// are errors here.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let (client, request) = builder.build_split();
        let request = request.map_err(IntoSpError::into_sp)?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, url = %redact_query(&url), "sending HTTP request");

        match client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, url = %redact_query(&url), %status, "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, url = %redact_query(&url), error = %err, "HTTP request failed");
                Err(err.into_sp())
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    /// `User-Agent` sent on every request; reqwest's default otherwise.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build both underlying clients.
    ///
    /// # Errors
    /// Returns `SpError::Config` if the TLS backend cannot be initialised.
    pub fn build(self) -> Result<HttpClient> {
        let plain = self.client_builder().no_gzip().no_deflate().build().map_err(build_error)?;
        let compressed = self.client_builder().gzip(true).deflate(true).build().map_err(build_error)?;

        Ok(HttpClient { plain, compressed })
    }

    fn client_builder(&self) -> reqwest::ClientBuilder {
        let mut builder = ReqwestClient::builder()
            .redirect(Policy::none())
            .pool_max_idle_per_host(0)
            .connect_timeout(CONNECT_TIMEOUT)
            .no_proxy();

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        builder
    }
}

fn build_error(err: reqwest::Error) -> SpError {
    SpError::Config(format!("failed to build HTTP client: {err}"))
}

/// Query strings can carry tokens; keep them out of logs.
fn redact_query(url: &Url) -> String {
    let mut shown = url.clone();
    if shown.query().is_some() {
        shown.set_query(Some("redacted"));
    }
    shown.to_string()
}
