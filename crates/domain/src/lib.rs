//! # sprest Domain
//!
//! Domain types for the sprest SharePoint client.
//!
//! This crate contains:
//! - The error taxonomy and `Result` alias shared by every layer
//! - Client configuration structures and their validation
//! - Value records decoded from REST responses (role definitions, users)
//! - Protocol constants (endpoint paths, header names, refresh margins)
//!
//! ## Architecture
//! - No dependencies on other sprest crates
//! - No I/O; the HTTP/XML plumbing lives in `sprest-infra`

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
