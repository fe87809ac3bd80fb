//! Injected-secrets credential store
//!
//! Read-only store over the key-value mapping the hosting platform injects
//! (materialized as a TOML document). The credential lives under the
//! `gmail_token` namespace, or as a base64-encoded JSON record under
//! `gmail_token_b64`; unrelated top-level keys (AI API keys and the like)
//! are ignored.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use primeline_core::CredentialStore;
use primeline_domain::constants::{DEFAULT_UNIVERSE_DOMAIN, SECRETS_B64_KEY, SECRETS_NAMESPACE};
use primeline_domain::{CredentialError, CredentialRecord, Result};
use tracing::debug;

use super::validate_record;

/// Read-only credential store backed by the injected secrets mapping.
///
/// Refreshed tokens cannot be written back here; they live in memory only
/// and are re-derived from the refresh token on every cold start.
pub struct InjectedSecretsStore {
    path: PathBuf,
}

impl InjectedSecretsStore {
    /// Create a store over the materialized secrets mapping.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for InjectedSecretsStore {
    async fn load(&self) -> Result<CredentialRecord> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialError::NoCredentialSource(format!(
                    "injected secrets mapping not present: {}",
                    self.path.display()
                )));
            }
            Err(err) => {
                return Err(CredentialError::MalformedCredentialFile(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )));
            }
        };

        let mapping: toml::Table = toml::from_str(&contents).map_err(|err| {
            CredentialError::MalformedCredentialFile(format!(
                "{} does not parse as a secrets mapping: {err}",
                self.path.display()
            ))
        })?;

        // The base64 whole-record variant is checked before the namespaced
        // table, matching how deployments historically provisioned it.
        let record = if let Some(value) = mapping.get(SECRETS_B64_KEY) {
            debug!(path = %self.path.display(), key = SECRETS_B64_KEY, "loading base64 credential");
            record_from_b64(value)?
        } else if let Some(value) = mapping.get(SECRETS_NAMESPACE) {
            debug!(path = %self.path.display(), key = SECRETS_NAMESPACE, "loading credential table");
            record_from_table(value)?
        } else {
            return Err(CredentialError::NoCredentialSource(format!(
                "no {SECRETS_NAMESPACE} entry in injected secrets {}",
                self.path.display()
            )));
        };

        validate_record(record, "injected secrets")
    }

    async fn persist(&self, _record: &CredentialRecord) -> Result<()> {
        Err(CredentialError::WriteBack("injected secrets mapping is read-only".to_string()))
    }

    fn writable(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!("injected secrets {}", self.path.display())
    }
}

fn record_from_b64(value: &toml::Value) -> Result<CredentialRecord> {
    let encoded = value.as_str().ok_or_else(|| {
        CredentialError::MalformedCredentialFile(format!("{SECRETS_B64_KEY} must be a string"))
    })?;

    let bytes = STANDARD.decode(encoded.trim()).map_err(|err| {
        CredentialError::MalformedCredentialFile(format!("{SECRETS_B64_KEY} is not valid base64: {err}"))
    })?;
    let json = String::from_utf8(bytes).map_err(|err| {
        CredentialError::MalformedCredentialFile(format!("{SECRETS_B64_KEY} is not UTF-8: {err}"))
    })?;

    serde_json::from_str(&json).map_err(|err| {
        CredentialError::MalformedCredentialFile(format!(
            "{SECRETS_B64_KEY} does not decode to a credential record: {err}"
        ))
    })
}

fn record_from_table(value: &toml::Value) -> Result<CredentialRecord> {
    let table = value.as_table().ok_or_else(|| {
        CredentialError::MalformedCredentialFile(format!("{SECRETS_NAMESPACE} must be a table"))
    })?;

    let universe_domain = match optional_str(table, "universe_domain")? {
        domain if domain.is_empty() => DEFAULT_UNIVERSE_DOMAIN.to_string(),
        domain => domain,
    };

    Ok(CredentialRecord {
        token: optional_str(table, "token")?,
        refresh_token: optional_str(table, "refresh_token")?,
        token_uri: optional_str(table, "token_uri")?,
        client_id: optional_str(table, "client_id")?,
        client_secret: optional_str(table, "client_secret")?,
        scopes: scopes_field(table)?,
        universe_domain,
        account: optional_str(table, "account")?,
        expiry: expiry_field(table)?,
    })
}

fn optional_str(table: &toml::Table, key: &str) -> Result<String> {
    match table.get(key) {
        None => Ok(String::new()),
        Some(toml::Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(CredentialError::MalformedCredentialFile(format!(
            "{SECRETS_NAMESPACE}.{key} must be a string"
        ))),
    }
}

fn scopes_field(table: &toml::Table) -> Result<Vec<String>> {
    match table.get("scopes") {
        None => Ok(Vec::new()),
        Some(toml::Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    CredentialError::MalformedCredentialFile(format!(
                        "{SECRETS_NAMESPACE}.scopes must be a list of strings"
                    ))
                })
            })
            .collect(),
        Some(_) => Err(CredentialError::MalformedCredentialFile(format!(
            "{SECRETS_NAMESPACE}.scopes must be a list of strings"
        ))),
    }
}

fn expiry_field(table: &toml::Table) -> Result<Option<DateTime<Utc>>> {
    let raw = match table.get("expiry") {
        None => return Ok(None),
        Some(toml::Value::String(s)) => s.clone(),
        // TOML's native datetime renders as RFC 3339
        Some(toml::Value::Datetime(dt)) => dt.to_string(),
        Some(_) => {
            return Err(CredentialError::MalformedCredentialFile(format!(
                "{SECRETS_NAMESPACE}.expiry must be a timestamp"
            )));
        }
    };

    let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|err| {
        CredentialError::MalformedCredentialFile(format!(
            "{SECRETS_NAMESPACE}.expiry is not a valid timestamp: {err}"
        ))
    })?;
    Ok(Some(parsed.with_timezone(&Utc)))
}
