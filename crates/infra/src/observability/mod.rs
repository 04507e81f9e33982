//! Tracing setup for binaries and tests
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! embedding program's choice. These helpers install the usual one: an
//! `EnvFilter` honouring `RUST_LOG` on top of a fmt layer writing to stderr.

use sprest_domain::{Result, SpError};
use tracing_subscriber::EnvFilter;

/// Output format of [`init_tracing_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line events
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install a global fmt subscriber.
///
/// `default_filter` (e.g. `"info,sprest_infra=debug"`) applies when
/// `RUST_LOG` is unset.
///
/// # Errors
/// Returns `SpError::Config` if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    init_tracing_with(default_filter, LogFormat::Pretty)
}

pub fn init_tracing_with(default_filter: &str, format: LogFormat) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| SpError::Config(format!("failed to install tracing subscriber: {e}")))
}
