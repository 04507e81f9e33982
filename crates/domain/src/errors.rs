//! Error types used throughout the client
//!
//! Three failure families matter to callers: the claims handshake failed
//! ([`SpError::Authentication`]), an HTTP exchange failed
//! ([`SpError::Request`]), or the service answered with XML we could not
//! understand ([`SpError::Parse`]). The remaining variants cover local
//! configuration, filesystem and deadline failures.

use std::time::Duration;

use thiserror::Error;

/// Categories of client errors, used for logging labels and matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpErrorCategory {
    /// Identity provider or sign-in handshake failed
    Authentication,
    /// Non-success HTTP status (including redirects)
    Status,
    /// DNS, connect, TLS or body streaming failure
    Transport,
    /// Expected XML element absent or malformed
    Parse,
    /// Invalid or missing configuration
    Config,
    /// Local filesystem failure
    Io,
    /// Caller cancelled or the deadline elapsed
    Aborted,
}

/// Main error type for sprest
#[derive(Error, Debug)]
pub enum SpError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request failed: {message}")]
    Request {
        /// HTTP status code, when the server answered at all
        status: Option<u16>,
        message: String,
    },

    #[error("Parse error at <{element}>: {message}")]
    Parse { element: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl SpError {
    /// Request failure carrying the HTTP status returned by the server.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Request { status: Some(status), message: message.into() }
    }

    /// Request failure below the HTTP layer (no status available).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Request { status: None, message: message.into() }
    }

    /// Parse failure naming the element that was expected.
    pub fn parse(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse { element: element.into(), message: message.into() }
    }

    /// Get the error category for this error
    pub fn category(&self) -> SpErrorCategory {
        match self {
            Self::Authentication(_) => SpErrorCategory::Authentication,
            Self::Request { status: Some(_), .. } => SpErrorCategory::Status,
            Self::Request { status: None, .. } => SpErrorCategory::Transport,
            Self::Parse { .. } => SpErrorCategory::Parse,
            Self::Config(_) => SpErrorCategory::Config,
            Self::Io(_) => SpErrorCategory::Io,
            Self::Timeout(_) | Self::Cancelled => SpErrorCategory::Aborted,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// HTTP status code attached to a request failure, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }

    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self.category() {
            SpErrorCategory::Authentication => "authentication",
            SpErrorCategory::Status => "status",
            SpErrorCategory::Transport => "transport",
            SpErrorCategory::Parse => "parse",
            SpErrorCategory::Config => "config",
            SpErrorCategory::Io => "io",
            SpErrorCategory::Aborted => "aborted",
        }
    }
}

/// Result type alias for sprest operations
pub type Result<T> = std::result::Result<T, SpError>;
