//! Connectivity status reported to the presentation layer

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CredentialError;

/// Health of the Gmail connection as rendered by the UI.
///
/// Derived and recomputed on demand, never persisted. A pure function of the
/// current credential state; see [`ConnectivityStatus::from_error`] for the
/// mapping from failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityStatus {
    /// A currently-valid or freshly-refreshed credential exists.
    Connected,
    /// No credential source, or the source lacks required secrets.
    OfflineNoSecrets,
    /// The access token is expired and no refresh has succeeded yet; a later
    /// attempt may recover.
    OfflineExpired,
    /// The provider rejected the refresh token; operator intervention is
    /// required.
    OfflineInvalid,
}

impl ConnectivityStatus {
    /// Whether mail operations can be expected to succeed.
    #[must_use]
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    /// Human-readable remediation hint for the presentation layer.
    #[must_use]
    pub fn remediation_hint(self) -> &'static str {
        match self {
            Self::Connected => "Gmail is connected",
            Self::OfflineNoSecrets => {
                "provision a token file or add a [gmail_token] section to the injected secrets"
            }
            Self::OfflineExpired => {
                "access token expired; it is refreshed on the next mail operation, check network \
                 connectivity if this persists"
            }
            Self::OfflineInvalid => {
                "refresh token expired or revoked; re-authorize and redeploy credentials"
            }
        }
    }

    /// Map a credential failure kind to the status the UI renders.
    ///
    /// Never fails; every error kind has a home. `WriteBack` maps to
    /// `Connected` because the refresh itself succeeded in memory.
    #[must_use]
    pub fn from_error(err: &CredentialError) -> Self {
        match err {
            CredentialError::NoCredentialSource(_)
            | CredentialError::IncompleteCredential(_)
            | CredentialError::Config(_) => Self::OfflineNoSecrets,
            CredentialError::RefreshTransient(_) => Self::OfflineExpired,
            CredentialError::RefreshPermanent(_)
            | CredentialError::MalformedCredentialFile(_)
            | CredentialError::ScopeMismatch(_) => Self::OfflineInvalid,
            CredentialError::WriteBack(_) => Self::Connected,
        }
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connected => "Connected",
            Self::OfflineNoSecrets => "Offline (No Secrets)",
            Self::OfflineExpired => "Offline (Expired)",
            Self::OfflineInvalid => "Offline (Invalid)",
        };
        write!(f, "{label}")
    }
}
