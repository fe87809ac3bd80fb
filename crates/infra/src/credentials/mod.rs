//! Credential backing stores and the source resolver
//!
//! Two mutually-exclusive stores back the canonical credential: the local
//! token file (read-write) and the injected secrets mapping materialized by
//! the hosting platform (read-only). The resolver selects exactly one at
//! startup and normalizes its content into a [`CredentialRecord`].

pub mod resolver;
pub mod secrets;
pub mod token_file;

use std::sync::Arc;
use std::time::Duration;

use primeline_core::CredentialLifecycle;
use primeline_domain::{CredentialError, CredentialRecord, GmailSettings, Result};
use url::Url;

use crate::integrations::gmail::oauth::GoogleTokenRefresher;

/// Wire the resolver, refresher, and lifecycle manager together.
///
/// This is the composition root the host application calls once at startup.
/// A failed resolution still yields a manager; it reports the matching
/// offline status and returns the resolution error from `ensure_valid`.
///
/// # Errors
/// Returns `Config` if the HTTP client cannot be constructed.
pub async fn initialize(settings: &GmailSettings) -> Result<Arc<CredentialLifecycle>> {
    let refresher =
        Arc::new(GoogleTokenRefresher::new(Duration::from_secs(settings.http_timeout_seconds))?);
    let resolution = resolver::resolve(settings).await;

    Ok(Arc::new(CredentialLifecycle::from_resolution(
        resolution,
        refresher,
        settings.refresh_margin_seconds,
    )))
}

/// Validate a record freshly read from a backing source.
///
/// Access token and expiry may legitimately be absent (the record is then
/// treated as already expired), but the refresh token, client material, and
/// scopes must be usable.
pub(crate) fn validate_record(record: CredentialRecord, origin: &str) -> Result<CredentialRecord> {
    if record.refresh_token.is_empty() {
        return Err(CredentialError::IncompleteCredential(format!(
            "{origin}: refresh_token is missing or empty"
        )));
    }
    for (field, value) in [
        ("token_uri", &record.token_uri),
        ("client_id", &record.client_id),
        ("client_secret", &record.client_secret),
    ] {
        if value.is_empty() {
            return Err(CredentialError::IncompleteCredential(format!(
                "{origin}: {field} is missing or empty"
            )));
        }
    }
    if record.scopes.is_empty() {
        return Err(CredentialError::IncompleteCredential(format!(
            "{origin}: scopes are missing or empty"
        )));
    }
    if Url::parse(&record.token_uri).is_err() {
        return Err(CredentialError::MalformedCredentialFile(format!(
            "{origin}: token_uri is not a valid URL: {}",
            record.token_uri
        )));
    }
    Ok(record)
}
