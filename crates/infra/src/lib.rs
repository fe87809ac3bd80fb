//! # PrimeLine Infra
//!
//! Infrastructure adapters for the Gmail credential subsystem.
//!
//! This crate contains:
//! - The credential-source resolver and its two backing stores
//!   (token file, injected secrets mapping)
//! - The Google OAuth token-endpoint client
//! - The Gmail API client facade
//! - The configuration loader

pub mod config;
pub mod credentials;
pub mod integrations;

// Re-export the composition surface
pub use credentials::resolver::resolve;
pub use credentials::secrets::InjectedSecretsStore;
pub use credentials::token_file::TokenFileStore;
pub use credentials::initialize;
pub use integrations::gmail::client::GmailClient;
pub use integrations::gmail::oauth::GoogleTokenRefresher;
