//! Token lifecycle manager with on-demand refresh
//!
//! Manages the canonical credential for the process lifetime:
//! - Fast-path validity check against a configurable safety margin
//! - On-demand refresh through the [`TokenRefresher`] port (never periodic)
//! - Write-back to the originating store when it is writable
//! - Connectivity status cache for the presentation layer

use std::sync::{Arc, RwLock as StdRwLock};

use primeline_domain::{ConnectivityStatus, CredentialError, CredentialRecord, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::ports::{CredentialStore, TokenRefresher};

/// Internal lifecycle state.
enum CredentialState {
    /// Resolution failed at startup; no record exists.
    Unavailable(CredentialError),

    /// A record was resolved and is exclusively owned by the manager.
    Loaded {
        record: CredentialRecord,
        /// Failure kind of the most recent refresh attempt, if any.
        /// A permanent failure here latches the manager offline.
        last_refresh_error: Option<CredentialError>,
    },
}

/// Token lifecycle manager
///
/// Exclusively owns the in-memory [`CredentialRecord`]; the facade and the
/// status reporter query this manager instead of holding copies. At most one
/// refresh is in flight at a time: concurrent callers observe either the
/// pre-refresh or the post-refresh record, never a partially-updated one.
///
/// When the credential came from the read-only injected mapping, refreshed
/// tokens live only in memory for the remainder of the process and are
/// re-derived from the refresh token on every cold start. This is an
/// accepted limitation of that source, not silently masked.
pub struct CredentialLifecycle {
    store: Option<Arc<dyn CredentialStore>>,
    refresher: Arc<dyn TokenRefresher>,
    refresh_margin_seconds: i64,
    state: RwLock<CredentialState>,
    refresh_gate: Mutex<()>,
    status: StdRwLock<ConnectivityStatus>,
}

impl CredentialLifecycle {
    /// Create a manager owning a freshly resolved record.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        record: CredentialRecord,
        refresher: Arc<dyn TokenRefresher>,
        refresh_margin_seconds: i64,
    ) -> Self {
        let initial_status = if record.needs_refresh(refresh_margin_seconds) {
            ConnectivityStatus::OfflineExpired
        } else {
            ConnectivityStatus::Connected
        };

        Self {
            store: Some(store),
            refresher,
            refresh_margin_seconds,
            state: RwLock::new(CredentialState::Loaded { record, last_refresh_error: None }),
            refresh_gate: Mutex::new(()),
            status: StdRwLock::new(initial_status),
        }
    }

    /// Create a manager for a failed resolution.
    ///
    /// `ensure_valid` keeps returning the resolution error; `status` reports
    /// the matching offline state.
    #[must_use]
    pub fn unavailable(
        error: CredentialError,
        refresher: Arc<dyn TokenRefresher>,
        refresh_margin_seconds: i64,
    ) -> Self {
        let initial_status = ConnectivityStatus::from_error(&error);

        Self {
            store: None,
            refresher,
            refresh_margin_seconds,
            state: RwLock::new(CredentialState::Unavailable(error)),
            refresh_gate: Mutex::new(()),
            status: StdRwLock::new(initial_status),
        }
    }

    /// Build a manager directly from a resolver outcome.
    #[must_use]
    pub fn from_resolution(
        resolution: Result<(Arc<dyn CredentialStore>, CredentialRecord)>,
        refresher: Arc<dyn TokenRefresher>,
        refresh_margin_seconds: i64,
    ) -> Self {
        match resolution {
            Ok((store, record)) => Self::new(store, record, refresher, refresh_margin_seconds),
            Err(err) => Self::unavailable(err, refresher, refresh_margin_seconds),
        }
    }

    /// Return a credential that is valid for at least the safety margin.
    ///
    /// The common fast path returns the current record unchanged without any
    /// network call. Otherwise a refresh grant is executed; transport
    /// failures surface as `RefreshTransient` (retry is the caller's
    /// responsibility), explicit provider rejections as `RefreshPermanent`,
    /// which latches: later calls return the stored error without retrying
    /// until an operator re-provisions the credential.
    ///
    /// # Errors
    /// Any [`CredentialError`] from resolution or refresh; never a torn
    /// record.
    pub async fn ensure_valid(&self) -> Result<CredentialRecord> {
        if let Some(outcome) = self.check_current().await {
            return self.finish(outcome);
        }

        let _gate = self.refresh_gate.lock().await;

        // A caller queued behind an in-flight refresh sees its result here
        // instead of issuing a second grant.
        if let Some(outcome) = self.check_current().await {
            return self.finish(outcome);
        }

        self.refresh_now().await
    }

    /// Current connectivity status.
    ///
    /// Non-blocking; never triggers a refresh. Recomputed by `ensure_valid`
    /// and by refresh outcomes.
    #[must_use]
    pub fn status(&self) -> ConnectivityStatus {
        *self.status.read().expect("status cell poisoned")
    }

    /// Current record without validity enforcement, if one was resolved.
    pub async fn record(&self) -> Option<CredentialRecord> {
        match &*self.state.read().await {
            CredentialState::Loaded { record, .. } => Some(record.clone()),
            CredentialState::Unavailable(_) => None,
        }
    }

    /// The configured safety margin in seconds.
    #[must_use]
    pub fn refresh_margin(&self) -> i64 {
        self.refresh_margin_seconds
    }

    /// Resolve the current state without refreshing.
    ///
    /// `Some(Ok)` - record valid beyond the margin, `Some(Err)` - failure
    /// that refreshing cannot fix right now, `None` - refresh required.
    async fn check_current(&self) -> Option<Result<CredentialRecord>> {
        let state = self.state.read().await;
        match &*state {
            CredentialState::Unavailable(err) => Some(Err(err.clone())),
            CredentialState::Loaded { record, last_refresh_error } => {
                if let Some(err @ CredentialError::RefreshPermanent(_)) = last_refresh_error {
                    return Some(Err(err.clone()));
                }
                if record.needs_refresh(self.refresh_margin_seconds) {
                    None
                } else {
                    Some(Ok(record.clone()))
                }
            }
        }
    }

    /// Record the outcome in the status cache and pass it through.
    fn finish(&self, outcome: Result<CredentialRecord>) -> Result<CredentialRecord> {
        match &outcome {
            Ok(_) => self.set_status(ConnectivityStatus::Connected),
            Err(err) => self.set_status(ConnectivityStatus::from_error(err)),
        }
        outcome
    }

    /// Execute the refresh grant. Caller must hold the refresh gate.
    async fn refresh_now(&self) -> Result<CredentialRecord> {
        let current = match &*self.state.read().await {
            CredentialState::Loaded { record, .. } => record.clone(),
            CredentialState::Unavailable(err) => return Err(err.clone()),
        };

        debug!("access token expired or near expiry; refreshing");

        match self.refresher.refresh(&current).await {
            Ok(refreshed) => {
                let mut updated = current;
                updated.apply_refresh(
                    refreshed.access_token,
                    refreshed.expires_in,
                    refreshed.refresh_token,
                );

                self.write_back(&updated).await;

                *self.state.write().await =
                    CredentialState::Loaded { record: updated.clone(), last_refresh_error: None };
                self.set_status(ConnectivityStatus::Connected);

                info!(expiry = ?updated.expiry, "access token refreshed");
                Ok(updated)
            }
            Err(err) => {
                if let CredentialState::Loaded { last_refresh_error, .. } =
                    &mut *self.state.write().await
                {
                    *last_refresh_error = Some(err.clone());
                }
                self.set_status(ConnectivityStatus::from_error(&err));

                warn!(error = %err, "token refresh failed");
                Err(err)
            }
        }
    }

    /// Persist a refreshed record to its source when that source is
    /// writable. Failure is non-fatal: the refreshed record stays valid in
    /// memory and the failure surfaces only as a warning.
    async fn write_back(&self, record: &CredentialRecord) {
        let Some(store) = &self.store else { return };

        if !store.writable() {
            debug!(
                source = %store.describe(),
                "source is read-only; refreshed token kept in memory only"
            );
            return;
        }

        if let Err(err) = store.persist(record).await {
            warn!(source = %store.describe(), error = %err, "credential write-back failed");
        }
    }

    fn set_status(&self, status: ConnectivityStatus) {
        *self.status.write().expect("status cell poisoned") = status;
    }
}
