//! # PrimeLine Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The Gmail token lifecycle manager and connectivity status reporter
//! - Port/adapter interfaces (traits) for credential storage and refresh
//!
//! ## Architecture Principles
//! - Only depends on `primeline-domain`
//! - No file, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod gmail;

// Re-export specific items to avoid ambiguity
pub use gmail::lifecycle::CredentialLifecycle;
pub use gmail::ports::{CredentialStore, RefreshedToken, TokenRefresher};
