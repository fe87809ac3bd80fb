//! Gmail integration
//!
//! [`oauth`] exchanges refresh tokens against the Google token endpoint;
//! [`client`] is the mail facade the rest of the application consumes.

pub mod client;
pub mod oauth;
