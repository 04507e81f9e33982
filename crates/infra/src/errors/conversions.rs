//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use sprest_domain::SpError;

/// Conversion of third-party errors into `SpError`, used at call sites as
/// `.map_err(IntoSpError::into_sp)`.
pub(crate) trait IntoSpError {
    fn into_sp(self) -> SpError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SpError */
/* -------------------------------------------------------------------------- */

impl IntoSpError for HttpError {
    fn into_sp(self) -> SpError {
        if self.is_timeout() {
            return SpError::transport(format!("HTTP request timed out: {self}"));
        }

        if self.is_connect() {
            return SpError::transport(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return SpError::status(
                code,
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status")),
            );
        }

        if self.is_body() || self.is_decode() {
            return SpError::transport(format!("HTTP body stream failed: {self}"));
        }

        SpError::transport(self.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* quick_xml::Error → SpError */
/* -------------------------------------------------------------------------- */

impl IntoSpError for quick_xml::Error {
    fn into_sp(self) -> SpError {
        SpError::parse("document", format!("malformed XML: {self}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
