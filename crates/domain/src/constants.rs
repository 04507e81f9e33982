//! Protocol constants
//!
//! Centralized location for endpoint paths, header names and the timing
//! constants of the session lifecycle.

// Identity provider (WS-Trust security token service)
pub const DEFAULT_IDENTITY_URL: &str = "https://login.microsoftonline.com/extSTS.srf";

// Target host endpoints (relative to host, or to host + site)
pub const SIGN_IN_PATH: &str = "/_forms/default.aspx?wa=wsignin1.0";
pub const CONTEXT_INFO_PATH: &str = "_api/contextinfo";

// Headers
pub const X_HTTP_METHOD: &str = "X-HTTP-Method";
pub const X_REQUEST_DIGEST: &str = "X-RequestDigest";
pub const ACCEPT_COMPRESSION: &str = "gzip, deflate";

// Content types
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";
pub const ODATA_VERBOSE_JSON: &str = "application/json;odata=verbose";

// Form digest refresh: refresh when now + margin >= expiry
pub const DIGEST_REFRESH_MARGIN_SECS: i64 = 60;

// Streaming transfers
pub const TRANSFER_CHUNK_SIZE: usize = 1024 * 1024;

// Deadlines
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TRANSFER_TIMEOUT_SECS: u64 = 3600;
