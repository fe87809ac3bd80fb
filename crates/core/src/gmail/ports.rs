//! Port interfaces for the credential lifecycle
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use primeline_domain::{CredentialRecord, Result};

/// Outcome of a successful refresh grant against the token endpoint.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    /// The new access token.
    pub access_token: String,
    /// Lifetime of the new token in seconds.
    pub expires_in: i64,
    /// Rotated refresh token, when the endpoint issued one. Endpoints may
    /// omit it; the existing refresh token is kept in that case.
    pub refresh_token: Option<String>,
}

/// Trait for a credential backing store
///
/// One store is selected at startup (token file or injected secrets
/// mapping) and consulted for the initial load and, when writable, for
/// persisting refreshed tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load and validate the credential record from the backing source.
    ///
    /// # Errors
    /// Returns `NoCredentialSource`, `IncompleteCredential`, or
    /// `MalformedCredentialFile` depending on what is wrong with the source.
    async fn load(&self) -> Result<CredentialRecord>;

    /// Persist a refreshed record back to the source.
    ///
    /// Only called when [`CredentialStore::writable`] is true.
    ///
    /// # Errors
    /// Returns `WriteBack` if the record could not be persisted.
    async fn persist(&self, record: &CredentialRecord) -> Result<()>;

    /// Whether the source supports write-back.
    fn writable(&self) -> bool;

    /// Short description of the source for log lines.
    fn describe(&self) -> String;
}

/// Trait for exchanging a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Execute the refresh grant for the given record.
    ///
    /// # Errors
    /// Returns `RefreshTransient` for transport-level failures (a later
    /// attempt may succeed) and `RefreshPermanent` when the provider
    /// explicitly rejected the refresh token.
    async fn refresh(&self, record: &CredentialRecord) -> Result<RefreshedToken>;
}
