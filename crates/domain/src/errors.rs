//! Error types used throughout the credential subsystem

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credential-lifecycle errors.
///
/// Every failure the resolver or the lifecycle manager can produce is one of
/// these kinds; the status reporter maps each kind to a
/// [`crate::ConnectivityStatus`] and the mail facade wraps them in
/// [`MailError::Unavailable`] so raw transport errors never reach the
/// presentation layer.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CredentialError {
    /// Neither the injected secrets mapping nor the token file is present.
    #[error("No credential source: {0}")]
    NoCredentialSource(String),

    /// A source exists but lacks required fields (most notably the refresh
    /// token).
    #[error("Incomplete credential: {0}")]
    IncompleteCredential(String),

    /// The token file (or base64 secrets blob) does not parse as a
    /// credential record.
    #[error("Malformed credential file: {0}")]
    MalformedCredentialFile(String),

    /// Refresh failed for transport reasons (network, timeout, 5xx). A later
    /// attempt may succeed; retry is the caller's responsibility.
    #[error("Token refresh failed (transient): {0}")]
    RefreshTransient(String),

    /// The provider explicitly rejected the refresh token. The credential
    /// cannot self-heal until an operator re-provisions it.
    #[error("Token refresh rejected by provider: {0}")]
    RefreshPermanent(String),

    /// The granted scope set does not cover a scope the operation requires.
    #[error("Missing required scope: {0}")]
    ScopeMismatch(String),

    /// Persisting the refreshed record failed. Non-fatal: the refreshed
    /// value is still valid in memory.
    #[error("Credential write-back failed: {0}")]
    WriteBack(String),

    /// Subsystem configuration is invalid or could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for credential operations
pub type Result<T> = std::result::Result<T, CredentialError>;

/// Errors surfaced by the Gmail client facade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// No usable credential; carries the original failure kind.
    #[error("Gmail unavailable: {0}")]
    Unavailable(#[from] CredentialError),

    /// The Gmail API returned a non-success status.
    #[error("Gmail API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// Transport failure talking to the Gmail API.
    #[error("Network error: {0}")]
    Network(String),
}
