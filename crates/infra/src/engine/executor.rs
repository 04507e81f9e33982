use std::io;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE,
};
use reqwest::{Body, Method, Response};
use sprest_domain::constants::{
    ACCEPT_COMPRESSION, CONTEXT_INFO_PATH, X_HTTP_METHOD, X_REQUEST_DIGEST,
};
use sprest_domain::{Result, SpError};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use super::descriptor::{RequestBody, RequestDescriptor, ResponseHandling, ResponsePayload};
use crate::errors::IntoSpError;
use crate::http::HttpClient;
use crate::session::{ContextInfoSource, Session};

/// Executes [`RequestDescriptor`]s against the remote service.
///
/// Every network exchange of the client goes through here: the claims
/// handshake, form digest refreshes and all endpoint calls.
pub struct RequestEngine {
    http: HttpClient,
    session: Session,
    site_url: String,
    default_timeout: Duration,
}

impl RequestEngine {
    /// `site_url` is host plus site path and must end with `/`.
    pub fn new(
        http: HttpClient,
        session: Session,
        site_url: impl Into<String>,
        default_timeout: Duration,
    ) -> Self {
        Self { http, session, site_url: site_url.into(), default_timeout }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Execute a request with the session cookies attached.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<ResponsePayload> {
        self.execute_cancellable(descriptor, &CancellationToken::new()).await
    }

    /// Execute a request, aborting with `SpError::Cancelled` as soon as
    /// `cancel` fires and with `SpError::Timeout` once the deadline passes.
    #[instrument(
        name = "sprest.execute",
        skip(self, descriptor, cancel),
        fields(method = %descriptor.method(), uri = %descriptor.uri())
    )]
    pub async fn execute_cancellable(
        &self,
        descriptor: RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ResponsePayload> {
        let deadline = descriptor.timeout.unwrap_or(self.default_timeout);
        let jar = self.session.cookie_jar().cloned();

        let run = async {
            let digest = if descriptor.needs_digest {
                Some(self.session.digest().get_digest(self).await?)
            } else {
                None
            };
            self.dispatch(descriptor, jar.as_deref(), digest).await
        };

        bounded(run, deadline, cancel).await
    }

    /// Current form digest, refreshed if it is missing or about to expire.
    pub async fn get_digest(&self) -> Result<String> {
        bounded(
            self.session.digest().get_digest(self),
            self.default_timeout,
            &CancellationToken::new(),
        )
        .await
    }

    /// Execute outside the session: cookies come from (and go to) `jar`
    /// instead of the session jar, and no digest is attached. Used by the
    /// claims handshake before the session exists.
    pub(crate) async fn execute_detached(
        &self,
        descriptor: RequestDescriptor,
        jar: Option<&Jar>,
    ) -> Result<ResponsePayload> {
        let deadline = descriptor.timeout.unwrap_or(self.default_timeout);
        bounded(self.dispatch(descriptor, jar, None), deadline, &CancellationToken::new()).await
    }

    async fn dispatch(
        &self,
        descriptor: RequestDescriptor,
        jar: Option<&Jar>,
        digest: Option<String>,
    ) -> Result<ResponsePayload> {
        let RequestDescriptor {
            uri,
            method,
            accept,
            accept_compression,
            method_override,
            body,
            response: handling,
            allow_redirect,
            ..
        } = descriptor;

        let url = Url::parse(&uri)
            .map_err(|err| SpError::transport(format!("invalid request URL {uri}: {err}")))?;

        let mut builder = self
            .http
            .request(method.clone(), url.clone(), accept_compression)
            .header(CONNECTION, "close");

        if let Some(accept) = &accept {
            builder = builder.header(ACCEPT, accept.as_str());
        }
        if let Some(cookies) = jar.and_then(|jar| jar.cookies(&url)) {
            builder = builder.header(COOKIE, cookies);
        }
        if accept_compression {
            builder = builder.header(ACCEPT_ENCODING, ACCEPT_COMPRESSION);
        }
        if let Some(method_override) = &method_override {
            builder = builder.header(X_HTTP_METHOD, method_override.as_str());
        }
        if let Some(digest) = digest {
            builder = builder.header(X_REQUEST_DIGEST, digest);
        }

        builder = match body {
            RequestBody::Empty if method == Method::POST => {
                builder.header(CONTENT_LENGTH, 0_u64).body(Vec::<u8>::new())
            }
            RequestBody::Empty => builder,
            RequestBody::Literal { content, content_type } => {
                builder = builder.header(CONTENT_LENGTH, content.len() as u64);
                if let Some(content_type) = content_type {
                    builder = builder.header(CONTENT_TYPE, content_type);
                }
                builder.body(content)
            }
            RequestBody::Producer(producer) => {
                let produced = producer.produce().await?;
                debug!(content_length = produced.content_length, "streaming request body");
                builder
                    .header(CONTENT_LENGTH, produced.content_length)
                    .body(Body::wrap_stream(produced.stream))
            }
        };

        let response = self.http.send(builder).await?;

        if let Some(jar) = jar {
            let mut set_cookies = response.headers().get_all(SET_COOKIE).iter();
            jar.set_cookies(&mut set_cookies, &url);
        }

        let status = response.status();
        if !(status.is_success() || (allow_redirect && status.is_redirection())) {
            return Err(status_error(&method, &url, &response));
        }

        match handling {
            ResponseHandling::Ignore => Ok(ResponsePayload::Empty),
            ResponseHandling::Text => {
                let text = response.text().await.map_err(IntoSpError::into_sp)?;
                Ok(ResponsePayload::Text(text))
            }
            ResponseHandling::Consumer(consumer) => {
                let stream = response.bytes_stream().map_err(io::Error::other);
                let mut reader = StreamReader::new(Box::pin(stream));
                let bytes = consumer.consume(&mut reader).await?;
                debug!(bytes, "response body consumed");
                Ok(ResponsePayload::Streamed { bytes })
            }
        }
    }
}

#[async_trait]
impl ContextInfoSource for RequestEngine {
    async fn fetch_context_info(&self) -> Result<String> {
        let uri = format!("{}{}", self.site_url, CONTEXT_INFO_PATH);
        let jar = self.session.cookie_jar().cloned();
        let payload = self.dispatch(RequestDescriptor::post(uri), jar.as_deref(), None).await?;
        Ok(payload.into_text())
    }
}

async fn bounded<T>(
    work: impl std::future::Future<Output = Result<T>>,
    deadline: Duration,
    cancel: &CancellationToken,
) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("request cancelled by caller");
            Err(SpError::Cancelled)
        }
        outcome = tokio::time::timeout(deadline, work) => {
            outcome.unwrap_or_else(|_| {
                warn!(?deadline, "request deadline elapsed");
                Err(SpError::Timeout(deadline))
            })
        }
    }
}

/// Build the failure for a non-success status without touching the body.
fn status_error(method: &Method, url: &Url, response: &Response) -> SpError {
    let status = response.status();
    let mut message = format!("{method} {} returned {status}", url.path());
    if let Some(location) = response.headers().get(LOCATION).and_then(|v| v.to_str().ok()) {
        message.push_str(&format!(" (redirect to {location} not followed)"));
    }
    warn!(%method, path = url.path(), status = status.as_u16(), "request rejected");
    SpError::status(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncRead, AsyncReadExt};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::engine::ResponseConsumer;
    use crate::session::MockClock;

    fn engine(server: &MockServer) -> RequestEngine {
        let session = Session::new(Arc::new(MockClock::default()), 60);
        RequestEngine::new(
            HttpClient::new().unwrap(),
            session,
            format!("{}/sites/dev/", server.uri()),
            Duration::from_secs(10),
        )
    }

    fn context_info(timeout: i64, digest: &str) -> String {
        format!(
            "<d:GetContextWebInformation xmlns:d=\"http://schemas.microsoft.com/ado/2007/08/dataservices\">\
             <d:FormDigestTimeoutSeconds>{timeout}</d:FormDigestTimeoutSeconds>\
             <d:FormDigestValue>{digest}</d:FormDigestValue>\
             </d:GetContextWebInformation>"
        )
    }

    struct Collect {
        sink: Arc<std::sync::Mutex<Vec<u8>>>,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ResponseConsumer for Collect {
        async fn consume(
            self: Box<Self>,
            source: &mut (dyn AsyncRead + Send + Unpin),
        ) -> Result<u64> {
            self.called.store(true, Ordering::SeqCst);
            let mut buf = Vec::new();
            source.read_to_end(&mut buf).await.map_err(|e| SpError::transport(e.to_string()))?;
            let len = buf.len() as u64;
            *self.sink.lock().unwrap() = buf;
            Ok(len)
        }
    }

    #[tokio::test]
    async fn attaches_requested_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/dev/_api/web"))
            .and(header("accept", "application/atom+xml"))
            .and(header("accept-encoding", "gzip, deflate"))
            .and(header("x-http-method", "MERGE"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<feed/>"))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine(&server);
        let descriptor = RequestDescriptor::get(format!("{}/sites/dev/_api/web", server.uri()))
            .accept("application/atom+xml")
            .accept_compression()
            .method_override("MERGE");

        let payload = engine.execute(descriptor).await.unwrap();
        assert_eq!(payload, ResponsePayload::Text("<feed/>".into()));
    }

    #[tokio::test]
    async fn empty_post_sends_zero_content_length() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-length", "0"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine(&server);
        engine.execute(RequestDescriptor::post(server.uri()).ignore_response()).await.unwrap();
    }

    #[tokio::test]
    async fn literal_body_carries_type_and_length() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "text/plain"))
            .and(header("content-length", "5"))
            .and(body_string("hello"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine(&server);
        let descriptor = RequestDescriptor::post(server.uri()).body_text("hello", Some("text/plain"));
        engine.execute(descriptor).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_is_request_error_and_body_is_never_consumed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<error/>"))
            .mount(&server)
            .await;

        let engine = engine(&server);
        let called = Arc::new(AtomicBool::new(false));
        let descriptor = RequestDescriptor::get(server.uri()).consume_with(Collect {
            sink: Arc::default(),
            called: called.clone(),
        });

        let err = engine.execute(descriptor).await.unwrap_err();
        assert!(matches!(err, SpError::Request { status: Some(404), .. }));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn redirect_is_an_error_unless_allowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/_layouts/15/start.aspx"))
            .mount(&server)
            .await;

        let engine = engine(&server);
        let err = engine.execute(RequestDescriptor::post(server.uri())).await.unwrap_err();
        assert_eq!(err.http_status(), Some(302));
        assert!(err.to_string().contains("not followed"));

        let ok = engine.execute(RequestDescriptor::post(server.uri()).allow_redirect()).await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn consumer_receives_streamed_body() {
        let server = MockServer::start().await;
        let body = vec![7_u8; 70_000];
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let engine = engine(&server);
        let sink = Arc::new(std::sync::Mutex::new(Vec::new()));
        let descriptor = RequestDescriptor::get(server.uri())
            .consume_with(Collect { sink: sink.clone(), called: Arc::default() });

        let payload = engine.execute(descriptor).await.unwrap();
        assert_eq!(payload, ResponsePayload::Streamed { bytes: 70_000 });
        assert_eq!(*sink.lock().unwrap(), body);
    }

    #[tokio::test]
    async fn digest_is_fetched_once_and_attached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sites/dev/_api/contextinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(context_info(1800, "abc")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sites/dev/_api/web/folders"))
            .and(header("x-requestdigest", "abc"))
            .respond_with(ResponseTemplate::new(201))
            .expect(2)
            .mount(&server)
            .await;

        let engine = engine(&server);
        let uri = format!("{}/sites/dev/_api/web/folders", server.uri());
        engine.execute(RequestDescriptor::post(uri.clone()).with_digest()).await.unwrap();
        engine.execute(RequestDescriptor::post(uri).with_digest()).await.unwrap();
        assert_eq!(engine.get_digest().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn detached_execution_captures_cookies_into_jar() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(302)
                    .append_header("Set-Cookie", "rtFa=one; Path=/")
                    .append_header("Set-Cookie", "FedAuth=two; Path=/"),
            )
            .mount(&server)
            .await;

        let engine = engine(&server);
        let jar = Jar::default();
        engine
            .execute_detached(RequestDescriptor::post(server.uri()).allow_redirect(), Some(&jar))
            .await
            .unwrap();

        let url = Url::parse(&server.uri()).unwrap();
        let cookies = jar.cookies(&url).unwrap();
        let cookies = cookies.to_str().unwrap();
        assert!(cookies.contains("rtFa=one"));
        assert!(cookies.contains("FedAuth=two"));
        assert!(!engine.session().is_authenticated());
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let engine = engine(&server);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = engine
            .execute_cancellable(RequestDescriptor::get(server.uri()), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SpError::Cancelled));
    }

    #[tokio::test]
    async fn deadline_yields_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let engine = engine(&server);
        let descriptor =
            RequestDescriptor::get(server.uri()).timeout(Duration::from_millis(100));
        let err = engine.execute(descriptor).await.unwrap_err();
        assert!(matches!(err, SpError::Timeout(d) if d == Duration::from_millis(100)));
    }
}
