//! Configuration loader
//!
//! Loads subsystem configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If none are set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. If no file exists either, uses the built-in defaults
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `PRIMELINE_TOKEN_FILE`: Path of the persisted token file
//! - `PRIMELINE_SECRETS_FILE`: Path of the injected secrets mapping
//! - `PRIMELINE_SOURCE_PRECEDENCE`: `prefer_injected` or `prefer_file`
//! - `PRIMELINE_REFRESH_MARGIN_SECS`: Safety margin before token expiry
//! - `PRIMELINE_HTTP_TIMEOUT_SECS`: Timeout for refresh and Gmail API calls
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./primeline.json` or `./primeline.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)

use std::path::{Path, PathBuf};

use primeline_domain::{CredentialError, GmailSettings, Result, SourcePrecedence};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If none of the
/// `PRIMELINE_*` variables are set, falls back to a config file; if no file
/// is found either, the built-in defaults apply (every setting in this
/// subsystem has one).
///
/// # Errors
/// Returns `CredentialError::Config` if a set variable or a found file has
/// an invalid value.
pub fn load() -> Result<GmailSettings> {
    if let Some(settings) = load_from_env()? {
        tracing::info!("Configuration loaded from environment variables");
        return Ok(settings);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok(GmailSettings::default())
        }
    }
}

/// Load configuration from environment variables
///
/// Returns `Ok(None)` when no `PRIMELINE_*` variable is set. Variables that
/// are set override the defaults individually.
///
/// # Errors
/// Returns `CredentialError::Config` if a set variable has an invalid value.
pub fn load_from_env() -> Result<Option<GmailSettings>> {
    let token_file = std::env::var("PRIMELINE_TOKEN_FILE").ok();
    let secrets_file = std::env::var("PRIMELINE_SECRETS_FILE").ok();
    let precedence = std::env::var("PRIMELINE_SOURCE_PRECEDENCE").ok();
    let refresh_margin = std::env::var("PRIMELINE_REFRESH_MARGIN_SECS").ok();
    let http_timeout = std::env::var("PRIMELINE_HTTP_TIMEOUT_SECS").ok();

    if token_file.is_none()
        && secrets_file.is_none()
        && precedence.is_none()
        && refresh_margin.is_none()
        && http_timeout.is_none()
    {
        return Ok(None);
    }

    let mut settings = GmailSettings::default();
    if let Some(value) = token_file {
        settings.token_file = value;
    }
    if let Some(value) = secrets_file {
        settings.secrets_file = value;
    }
    if let Some(value) = precedence {
        settings.source_precedence = value
            .parse::<SourcePrecedence>()
            .map_err(|e| CredentialError::Config(format!("Invalid source precedence: {e}")))?;
    }
    if let Some(value) = refresh_margin {
        settings.refresh_margin_seconds = value
            .parse::<i64>()
            .map_err(|e| CredentialError::Config(format!("Invalid refresh margin: {e}")))?;
    }
    if let Some(value) = http_timeout {
        settings.http_timeout_seconds = value
            .parse::<u64>()
            .map_err(|e| CredentialError::Config(format!("Invalid HTTP timeout: {e}")))?;
    }

    Ok(Some(settings))
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `CredentialError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<GmailSettings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CredentialError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CredentialError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CredentialError::Config(format!("Failed to read config file: {e}")))?;

    parse_settings(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_settings(contents: &str, path: &Path) -> Result<GmailSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CredentialError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CredentialError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(CredentialError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("primeline.json"),
            cwd.join("primeline.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
        ]);
    }

    candidates.into_iter().find(|path| path.exists())
}
