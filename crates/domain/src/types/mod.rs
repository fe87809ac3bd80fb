//! Common data types used throughout the credential subsystem

mod credentials;
mod mail;
mod status;

pub use credentials::CredentialRecord;
pub use mail::{MailMessage, SentMessage};
pub use status::ConnectivityStatus;
