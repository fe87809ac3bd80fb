//! Mock port implementations for lifecycle tests
//!
//! In-memory stand-ins for the credential store and the token refresher,
//! enabling deterministic unit tests without filesystem or network
//! dependencies.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use primeline_core::{CredentialStore, RefreshedToken, TokenRefresher};
use primeline_domain::{CredentialError, CredentialRecord, Result};

/// Build a record whose access token expires `expires_in_secs` from now.
/// Negative values produce an already-expired record.
pub fn sample_record(expires_in_secs: i64) -> CredentialRecord {
    CredentialRecord {
        token: "ya29.original".to_string(),
        refresh_token: "1//refresh".to_string(),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
        client_id: "client-id.apps.googleusercontent.com".to_string(),
        client_secret: "client-secret".to_string(),
        scopes: vec![
            "https://www.googleapis.com/auth/gmail.send".to_string(),
            "https://www.googleapis.com/auth/gmail.readonly".to_string(),
            "https://www.googleapis.com/auth/gmail.modify".to_string(),
        ],
        universe_domain: "googleapis.com".to_string(),
        account: String::new(),
        expiry: Some(Utc::now() + ChronoDuration::seconds(expires_in_secs)),
    }
}

/// In-memory mock for `CredentialStore`.
pub struct MockCredentialStore {
    persisted: Mutex<Option<CredentialRecord>>,
    writable: bool,
    fail_persist: bool,
    persist_calls: AtomicUsize,
}

impl MockCredentialStore {
    pub fn writable() -> Self {
        Self {
            persisted: Mutex::new(None),
            writable: true,
            fail_persist: false,
            persist_calls: AtomicUsize::new(0),
        }
    }

    pub fn read_only() -> Self {
        Self { writable: false, ..Self::writable() }
    }

    pub fn failing() -> Self {
        Self { fail_persist: true, ..Self::writable() }
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    pub fn persisted(&self) -> Option<CredentialRecord> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn load(&self) -> Result<CredentialRecord> {
        self.persisted
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CredentialError::NoCredentialSource("mock store is empty".to_string()))
    }

    async fn persist(&self, record: &CredentialRecord) -> Result<()> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_persist {
            return Err(CredentialError::WriteBack("mock persist failure".to_string()));
        }
        *self.persisted.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    fn writable(&self) -> bool {
        self.writable
    }

    fn describe(&self) -> String {
        "mock store".to_string()
    }
}

/// Scripted mock for `TokenRefresher`.
///
/// Pops one scripted outcome per call; counts calls so tests can assert how
/// many grants were actually issued. An optional delay widens the refresh
/// window for concurrency tests.
pub struct ScriptedRefresher {
    script: Mutex<VecDeque<Result<RefreshedToken>>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedRefresher {
    pub fn new(script: Vec<Result<RefreshedToken>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn success(access_token: &str) -> Result<RefreshedToken> {
        Ok(RefreshedToken {
            access_token: access_token.to_string(),
            expires_in: 3600,
            refresh_token: None,
        })
    }
}

#[async_trait]
impl TokenRefresher for ScriptedRefresher {
    async fn refresh(&self, _record: &CredentialRecord) -> Result<RefreshedToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CredentialError::RefreshTransient("script exhausted".into())))
    }
}
