//! SharePoint REST client
//!
//! [`SharePointClient`] authenticates on construction and exposes the REST
//! endpoints (folders, files, role definitions, site users) on top of the
//! request engine.

pub mod client;
mod endpoints;
pub mod paths;

pub use client::SharePointClient;
