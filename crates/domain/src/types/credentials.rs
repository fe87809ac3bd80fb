//! Canonical OAuth2 credential record
//!
//! A single normalized in-memory representation of the Gmail OAuth material,
//! regardless of which backing store it was resolved from. The serde field
//! shape matches the persisted token file one-for-one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_UNIVERSE_DOMAIN;

/// Canonical Gmail OAuth2 credential.
///
/// A record is usable iff its refresh token is non-empty AND either the
/// access token is non-empty with an expiry in the future, or a refresh can
/// be performed. Scopes are immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Short-lived access token. Empty when the source never held one.
    #[serde(default)]
    pub token: String,

    /// Long-lived refresh token. A record without one is unusable.
    #[serde(default)]
    pub refresh_token: String,

    /// OAuth token endpoint used for the refresh grant.
    pub token_uri: String,

    /// OAuth client identifier.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Granted scopes, in the order they were issued.
    pub scopes: Vec<String>,

    /// Issuing authority domain.
    #[serde(default = "default_universe_domain")]
    pub universe_domain: String,

    /// Owning account identifier. May be empty.
    #[serde(default)]
    pub account: String,

    /// Absolute access-token expiry (UTC). Absent means already expired,
    /// which forces a refresh on first use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_universe_domain() -> String {
    DEFAULT_UNIVERSE_DOMAIN.to_string()
}

impl CredentialRecord {
    /// Check whether the access token must be refreshed before use.
    ///
    /// Returns `true` if the token is empty, has no expiry, or expires
    /// within `safety_margin_seconds` from now.
    #[must_use]
    pub fn needs_refresh(&self, safety_margin_seconds: i64) -> bool {
        if self.token.is_empty() {
            return true;
        }
        match self.expiry {
            Some(expiry) => Utc::now() + Duration::seconds(safety_margin_seconds) >= expiry,
            None => true,
        }
    }

    /// Check whether the record can ever produce a valid access token.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// First required scope the granted set does not cover, if any.
    #[must_use]
    pub fn first_missing_scope<'a>(&self, required: &'a [&str]) -> Option<&'a str> {
        required.iter().find(|scope| !self.scopes.iter().any(|s| s == *scope)).copied()
    }

    /// Apply the outcome of a successful refresh.
    ///
    /// Replaces the access token and expiry. The refresh token is replaced
    /// only when the endpoint returned a new non-empty one; endpoints may
    /// omit it, in which case the existing token is preserved.
    pub fn apply_refresh(
        &mut self,
        access_token: String,
        expires_in_seconds: i64,
        refresh_token: Option<String>,
    ) {
        self.token = access_token;
        self.expiry = Some(Utc::now() + Duration::seconds(expires_in_seconds));
        if let Some(new_refresh) = refresh_token {
            if !new_refresh.is_empty() {
                self.refresh_token = new_refresh;
            }
        }
    }
}
