//! File-backed credential store
//!
//! Reads and rewrites the persisted JSON token record. Writes are atomic
//! (write-to-temp + rename) so an interrupted process never leaves a corrupt
//! file behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use primeline_core::CredentialStore;
use primeline_domain::{CredentialError, CredentialRecord, Result};
use tracing::debug;

use super::validate_record;

/// Read-write credential store backed by a local JSON token file.
pub struct TokenFileStore {
    path: PathBuf,
}

impl TokenFileStore {
    /// Create a store for the given token file path.
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
impl CredentialStore for TokenFileStore {
    async fn load(&self) -> Result<CredentialRecord> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialError::NoCredentialSource(format!(
                    "token file not found: {}",
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

        let record: CredentialRecord = serde_json::from_str(&contents).map_err(|err| {
            CredentialError::MalformedCredentialFile(format!(
                "{} does not parse as a credential record: {err}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), "loaded credential from token file");
        validate_record(record, "token file")
    }

    async fn persist(&self, record: &CredentialRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|err| CredentialError::WriteBack(format!("failed to serialize record: {err}")))?;

        // Write to a sibling temp file, then rename over the target so a
        // crash mid-write cannot corrupt the existing record.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|err| {
            CredentialError::WriteBack(format!("failed to write {}: {err}", tmp.display()))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|err| {
            CredentialError::WriteBack(format!(
                "failed to replace {}: {err}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), "wrote refreshed credential to token file");
        Ok(())
    }

    fn writable(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("token file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    use super::*;

    fn record() -> CredentialRecord {
        CredentialRecord {
            token: "ya29.access".to_string(),
            refresh_token: "1//refresh".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "GOCSPX-secret".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/gmail.send".to_string()],
            universe_domain: "googleapis.com".to_string(),
            account: "ops@primeline.example".to_string(),
            expiry: Some(Utc::now() + Duration::hours(1)),
        }
    }

    #[tokio::test]
    async fn missing_file_is_no_credential_source() {
        let dir = TempDir::new().unwrap();
        let store = TokenFileStore::new(dir.path().join("token.json"));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CredentialError::NoCredentialSource(_)));
    }

    #[tokio::test]
    async fn unparseable_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = TokenFileStore::new(path);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CredentialError::MalformedCredentialFile(_)));
    }

    #[tokio::test]
    async fn file_without_refresh_token_is_incomplete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        let mut rec = record();
        rec.refresh_token = String::new();
        std::fs::write(&path, serde_json::to_string(&rec).unwrap()).unwrap();
        let store = TokenFileStore::new(path);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CredentialError::IncompleteCredential(_)));
    }

    #[tokio::test]
    async fn persist_then_load_round_trips_field_for_field() {
        let dir = TempDir::new().unwrap();
        let store = TokenFileStore::new(dir.path().join("token.json"));
        let rec = record();

        store.persist(&rec).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, rec);
        // No temp file left behind
        assert!(!dir.path().join("token.json.tmp").exists());
    }

    #[tokio::test]
    async fn persist_replaces_existing_record() {
        let dir = TempDir::new().unwrap();
        let store = TokenFileStore::new(dir.path().join("token.json"));

        store.persist(&record()).await.unwrap();
        let mut updated = record();
        updated.token = "ya29.refreshed".to_string();
        store.persist(&updated).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.token, "ya29.refreshed");
    }
}
