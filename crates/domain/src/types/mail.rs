//! Mail data types returned by the Gmail client facade

use serde::{Deserialize, Serialize};

/// A received message, with headers extracted and body decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    /// Provider message id.
    pub id: String,
    /// Conversation thread id.
    pub thread_id: String,
    /// Subject header, or "No Subject".
    pub subject: String,
    /// From header, or "Unknown".
    pub sender: String,
    /// Decoded text body (plain text preferred over HTML).
    pub body: String,
    /// Provider-internal receive timestamp (epoch milliseconds, as the
    /// provider reports it).
    pub date: String,
    /// Label ids currently applied to the message.
    pub labels: Vec<String>,
}

/// Acknowledgement for a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    /// Provider id of the new message.
    pub id: String,
    /// Thread the message was added to.
    pub thread_id: String,
}
