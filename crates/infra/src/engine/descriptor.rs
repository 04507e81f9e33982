//! Declarative description of a single HTTP exchange
//!
//! A [`RequestDescriptor`] says what to send (URI, method, headers, body)
//! and how to treat the response body. Bodies and response handling are
//! closed sets of variants; streaming strategies plug in through
//! [`BodyProducer`] and [`ResponseConsumer`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use reqwest::Method;
use sprest_domain::Result;
use tokio::io::AsyncRead;

/// Body produced by a streaming [`BodyProducer`]
pub struct ProducedBody {
    /// Exact number of bytes `stream` yields; sent as `Content-Length`
    pub content_length: u64,
    /// Body chunks in order
    pub stream: BoxStream<'static, std::io::Result<Bytes>>,
}

/// Streams a request body instead of buffering it in memory
#[async_trait]
pub trait BodyProducer: Send {
    /// Open the underlying source and hand back a sized chunk stream.
    async fn produce(self: Box<Self>) -> Result<ProducedBody>;
}

/// Consumes a response body as it arrives
#[async_trait]
pub trait ResponseConsumer: Send {
    /// Read `source` to the end and return the number of bytes consumed.
    async fn consume(self: Box<Self>, source: &mut (dyn AsyncRead + Send + Unpin)) -> Result<u64>;
}

/// What to send as the request body
pub enum RequestBody {
    /// No body; POST requests still carry `Content-Length: 0`
    Empty,
    /// Fixed bytes, sent with their exact length
    Literal { content: Bytes, content_type: Option<String> },
    Producer(Box<dyn BodyProducer>),
}

/// What to do with a successful response body
pub enum ResponseHandling {
    /// Drop the body unread
    Ignore,
    /// Read the whole body as UTF-8 text
    Text,
    Consumer(Box<dyn ResponseConsumer>),
}

/// Result of a successful exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    /// Body ignored
    Empty,
    /// Full body read as UTF-8
    Text(String),
    /// Body was handed to a consumer; the payload lives wherever it wrote
    Streamed { bytes: u64 },
}

impl ResponsePayload {
    /// Response text; empty for ignored or streamed bodies.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Empty | Self::Streamed { .. } => String::new(),
        }
    }
}

/// Everything the engine needs to perform one request
pub struct RequestDescriptor {
    pub(crate) uri: String,
    pub(crate) method: Method,
    pub(crate) accept: Option<String>,
    pub(crate) accept_compression: bool,
    pub(crate) method_override: Option<String>,
    pub(crate) needs_digest: bool,
    pub(crate) body: RequestBody,
    pub(crate) response: ResponseHandling,
    pub(crate) allow_redirect: bool,
    pub(crate) timeout: Option<Duration>,
}

impl RequestDescriptor {
    /// Request for `uri` with no body whose response is read as text.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method,
            accept: None,
            accept_compression: false,
            method_override: None,
            needs_digest: false,
            body: RequestBody::Empty,
            response: ResponseHandling::Text,
            allow_redirect: false,
            timeout: None,
        }
    }

    /// `GET uri`
    #[must_use]
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// `POST uri`; without a body it still sends `Content-Length: 0`.
    #[must_use]
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Send an `Accept` header.
    #[must_use]
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Ask for a gzip/deflate encoded response (decoded transparently).
    #[must_use]
    pub fn accept_compression(mut self) -> Self {
        self.accept_compression = true;
        self
    }

    /// Send `X-HTTP-Method: <method>` (e.g. `DELETE` tunnelled over POST).
    #[must_use]
    pub fn method_override(mut self, method: impl Into<String>) -> Self {
        self.method_override = Some(method.into());
        self
    }

    /// Attach `X-RequestDigest`, refreshing the form digest if needed.
    #[must_use]
    pub fn with_digest(mut self) -> Self {
        self.needs_digest = true;
        self
    }

    /// Send `content` as the body, with `content_type` when given.
    #[must_use]
    pub fn body_text(mut self, content: impl Into<String>, content_type: Option<&str>) -> Self {
        self.body = RequestBody::Literal {
            content: Bytes::from(content.into()),
            content_type: content_type.map(str::to_string),
        };
        self
    }

    /// Stream the body from `producer`.
    #[must_use]
    pub fn body_producer(mut self, producer: impl BodyProducer + 'static) -> Self {
        self.body = RequestBody::Producer(Box::new(producer));
        self
    }

    /// Drop the response body unread.
    #[must_use]
    pub fn ignore_response(mut self) -> Self {
        self.response = ResponseHandling::Ignore;
        self
    }

    /// Hand the response body to `consumer` instead of reading it as text.
    #[must_use]
    pub fn consume_with(mut self, consumer: impl ResponseConsumer + 'static) -> Self {
        self.response = ResponseHandling::Consumer(Box::new(consumer));
        self
    }

    /// Treat 3xx as success instead of a failure. Only the form sign-in
    /// needs this: it answers with a redirect carrying the session cookies.
    #[must_use]
    pub fn allow_redirect(mut self) -> Self {
        self.allow_redirect = true;
        self
    }

    /// Override the engine's default deadline for this request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Target URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn needs_digest(&self) -> bool {
        self.needs_digest
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.body {
            RequestBody::Empty => "empty".to_string(),
            RequestBody::Literal { content, .. } => format!("literal({} bytes)", content.len()),
            RequestBody::Producer(_) => "producer".to_string(),
        };
        let response = match &self.response {
            ResponseHandling::Ignore => "ignore",
            ResponseHandling::Text => "text",
            ResponseHandling::Consumer(_) => "consumer",
        };
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("accept", &self.accept)
            .field("accept_compression", &self.accept_compression)
            .field("method_override", &self.method_override)
            .field("needs_digest", &self.needs_digest)
            .field("body", &body)
            .field("response", &response)
            .field("allow_redirect", &self.allow_redirect)
            .field("timeout", &self.timeout)
            .finish()
    }
}
