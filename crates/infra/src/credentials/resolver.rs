//! Credential source resolver
//!
//! Locates OAuth credential material in exactly one of the two backing
//! stores and normalizes it into the canonical record. Selection happens
//! once at startup; a pure read with no network calls.

use std::sync::Arc;

use primeline_core::CredentialStore;
use primeline_domain::{
    CredentialError, CredentialRecord, GmailSettings, Result, SourcePrecedence,
};
use tracing::{debug, info};

use super::secrets::InjectedSecretsStore;
use super::token_file::TokenFileStore;

/// Resolve the credential from the first present source.
///
/// The injected secrets mapping is consulted first by default (cloud
/// environments inject it; local environments have the token file);
/// [`SourcePrecedence`] flips the order. A source that is present but
/// broken (incomplete fields, unparseable content) fails resolution
/// outright instead of silently falling through to the other source.
///
/// # Errors
/// `NoCredentialSource` when neither source is present; otherwise the
/// first present source's own failure.
pub async fn resolve(
    settings: &GmailSettings,
) -> Result<(Arc<dyn CredentialStore>, CredentialRecord)> {
    let candidates: [Arc<dyn CredentialStore>; 2] = match settings.source_precedence {
        SourcePrecedence::PreferInjected => [
            Arc::new(InjectedSecretsStore::new(&settings.secrets_file)),
            Arc::new(TokenFileStore::new(&settings.token_file)),
        ],
        SourcePrecedence::PreferFile => [
            Arc::new(TokenFileStore::new(&settings.token_file)),
            Arc::new(InjectedSecretsStore::new(&settings.secrets_file)),
        ],
    };

    let mut absent = Vec::new();
    for store in candidates {
        match store.load().await {
            Ok(record) => {
                info!(source = %store.describe(), "resolved gmail credential");
                return Ok((store, record));
            }
            Err(CredentialError::NoCredentialSource(reason)) => {
                debug!(source = %store.describe(), "source not present, trying next");
                absent.push(reason);
            }
            Err(err) => return Err(err),
        }
    }

    Err(CredentialError::NoCredentialSource(absent.join("; ")))
}
