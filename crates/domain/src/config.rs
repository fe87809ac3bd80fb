//! Configuration structures for the credential subsystem

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_REFRESH_MARGIN_SECS};

/// Which backing store wins when both the injected secrets mapping and the
/// local token file are present.
///
/// The injected mapping is the cloud-environment signal, so it wins by
/// default; deployments that want the file to take priority can flip this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePrecedence {
    /// Injected secrets mapping is consulted first (default).
    #[default]
    PreferInjected,
    /// Local token file is consulted first.
    PreferFile,
}

impl FromStr for SourcePrecedence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prefer_injected" | "injected" | "secrets" => Ok(Self::PreferInjected),
            "prefer_file" | "file" => Ok(Self::PreferFile),
            other => Err(format!("unknown source precedence: {other}")),
        }
    }
}

/// Settings for the Gmail credential subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailSettings {
    /// Path of the persisted token file (read-write source).
    pub token_file: String,
    /// Path of the injected secrets mapping materialized by the hosting
    /// platform (read-only source).
    pub secrets_file: String,
    /// Which source wins when both are present.
    pub source_precedence: SourcePrecedence,
    /// Safety margin before expiry at which a token is refreshed early.
    pub refresh_margin_seconds: i64,
    /// Timeout applied to token refresh and Gmail API requests.
    pub http_timeout_seconds: u64,
}

impl Default for GmailSettings {
    fn default() -> Self {
        Self {
            token_file: "token.json".to_string(),
            secrets_file: "secrets.toml".to_string(),
            source_precedence: SourcePrecedence::default(),
            refresh_margin_seconds: DEFAULT_REFRESH_MARGIN_SECS,
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = GmailSettings::default();
        assert_eq!(settings.token_file, "token.json");
        assert_eq!(settings.secrets_file, "secrets.toml");
        assert_eq!(settings.source_precedence, SourcePrecedence::PreferInjected);
        assert_eq!(settings.refresh_margin_seconds, 60);
        assert_eq!(settings.http_timeout_seconds, 30);
    }

    #[test]
    fn precedence_parses_common_spellings() {
        assert_eq!("injected".parse::<SourcePrecedence>(), Ok(SourcePrecedence::PreferInjected));
        assert_eq!("prefer_file".parse::<SourcePrecedence>(), Ok(SourcePrecedence::PreferFile));
        assert!("keychain".parse::<SourcePrecedence>().is_err());
    }

    #[test]
    fn settings_deserialize_from_partial_toml() {
        let settings: GmailSettings =
            toml_like_json(r#"{"token_file": "/var/lib/primeline/token.json"}"#);
        assert_eq!(settings.token_file, "/var/lib/primeline/token.json");
        // Unspecified fields fall back to defaults
        assert_eq!(settings.refresh_margin_seconds, 60);
    }

    fn toml_like_json(raw: &str) -> GmailSettings {
        serde_json::from_str(raw).unwrap()
    }
}
