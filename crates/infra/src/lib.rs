//! # sprest Infrastructure
//!
//! I/O side of the sprest SharePoint client.
//!
//! This crate contains:
//! - The HTTP transport (reqwest, no redirects, no keep-alive)
//! - The session store, clock and form digest cache
//! - The claims-based authenticator (WS-Trust token + form sign-in)
//! - The request engine every call flows through
//! - Streaming file transfer producers/consumers
//! - XML readers for SOAP and OData responses
//! - The REST endpoint layer (`SharePointClient`)
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Domain types and errors come from `sprest-domain`
//! - `RequestEngine::execute` is the single chokepoint for network I/O

pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
mod errors;
pub mod http;
pub mod observability;
pub mod session;
pub mod transfer;
pub mod xml;

// Re-export commonly used items
pub use api::SharePointClient;
pub use auth::Authenticator;
pub use engine::{
    BodyProducer, ProducedBody, RequestBody, RequestDescriptor, RequestEngine, ResponseConsumer,
    ResponseHandling, ResponsePayload,
};
pub use http::{HttpClient, HttpClientBuilder};
pub use session::{Clock, ContextInfoSource, DigestCache, MockClock, Session, SystemClock};
pub use transfer::{FileDownload, FileUpload};
