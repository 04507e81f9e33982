//! Authenticated SharePoint client
//!
//! Owns the request engine (and through it the session). Construction runs
//! the claims handshake; a value of this type is always authenticated.

use std::sync::Arc;

use sprest_domain::{ClientConfig, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::auth::Authenticator;
use crate::engine::{RequestDescriptor, RequestEngine, ResponsePayload};
use crate::http::HttpClient;
use crate::session::{Clock, Session, SystemClock};

/// SharePoint Online REST client bound to one site
pub struct SharePointClient {
    pub(crate) engine: RequestEngine,
    pub(crate) config: ClientConfig,
}

impl SharePointClient {
    /// Authenticate against `config.host` and return a ready client
    ///
    /// # Errors
    ///
    /// Returns `SpError::Config` for an invalid configuration and
    /// `SpError::Authentication` if the claims handshake fails. No
    /// partially authenticated client is ever returned.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        Self::connect_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Same as [`connect`](Self::connect) with an injected clock driving
    /// form digest expiry.
    #[instrument(skip(config, clock), fields(host = %config.host, site = %config.site))]
    pub async fn connect_with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let mut http = HttpClient::builder();
        if let Some(agent) = &config.user_agent {
            http = http.user_agent(agent.clone());
        }
        let http = http.build()?;

        let session = Session::new(clock, config.digest_refresh_margin_secs);
        let engine = RequestEngine::new(http, session, config.site_url(), config.request_timeout());

        let jar = Authenticator::from_config(&config)
            .authenticate(&engine, &config.username, &config.password)
            .await?;
        engine.session().install_cookies(jar)?;

        info!(username = %config.username, "SharePoint session established");
        Ok(Self { engine, config })
    }

    pub fn engine(&self) -> &RequestEngine {
        &self.engine
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        self.engine.session()
    }

    /// Run an arbitrary request through the session.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<ResponsePayload> {
        self.engine.execute(descriptor).await
    }

    pub async fn execute_cancellable(
        &self,
        descriptor: RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ResponsePayload> {
        self.engine.execute_cancellable(descriptor, cancel).await
    }

    /// Current form digest, refreshed when it is within the refresh margin
    /// of its expiry.
    pub async fn get_digest(&self) -> Result<String> {
        self.engine.get_digest().await
    }
}
