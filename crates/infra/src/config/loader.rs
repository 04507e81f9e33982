//! Configuration loader
//!
//! Loads the client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SPREST_HOST`: Target host, e.g. `https://contoso.sharepoint.com`
//! - `SPREST_SITE`: Server-relative site path with slashes, e.g. `/sites/dev/`
//! - `SPREST_USERNAME`: Account name
//! - `SPREST_PASSWORD`: Account password
//! - `SPREST_IDENTITY_URL`: Security token service (optional)
//! - `SPREST_REQUEST_TIMEOUT_SECS`: Per-request deadline (optional)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./sprest.toml` or `./sprest.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use sprest_domain::{ClientConfig, Result, SpError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file. The
/// result is validated either way.
///
/// # Errors
/// Returns `SpError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<ClientConfig> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `SpError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<ClientConfig> {
    load_from_lookup(|key| std::env::var(key).ok())
}

/// Build a configuration from an arbitrary variable lookup.
///
/// `load_from_env` uses the process environment; tests pass a map.
pub fn load_from_lookup<F>(lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| {
        lookup(key).ok_or_else(|| {
            SpError::Config(format!("Missing required environment variable: {}", key))
        })
    };

    let mut config = ClientConfig::new(
        required("SPREST_HOST")?,
        required("SPREST_SITE")?,
        required("SPREST_USERNAME")?,
        required("SPREST_PASSWORD")?,
    );

    if let Some(url) = lookup("SPREST_IDENTITY_URL") {
        config = config.with_identity_url(url);
    }
    if let Some(secs) = lookup("SPREST_REQUEST_TIMEOUT_SECS") {
        config.request_timeout_secs = secs
            .parse::<u64>()
            .map_err(|e| SpError::Config(format!("Invalid request timeout: {}", e)))?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SpError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SpError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SpError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SpError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content; format by extension.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SpError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SpError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SpError::Config(format!("Unsupported config format: {}", extension))),
    }
}

const CONFIG_FILE_NAMES: [&str; 4] = ["sprest.toml", "sprest.json", "config.toml", "config.json"];

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    probe_in(&dirs)
}

fn probe_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}
