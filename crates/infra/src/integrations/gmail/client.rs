//! Gmail API client facade
//!
//! Every operation obtains a valid credential from the lifecycle manager
//! first and fails closed with [`MailError::Unavailable`] when none is
//! available; a handle is never returned half-initialized. The granted
//! scope set is checked against what the operation requires before any
//! request is made.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use primeline_core::CredentialLifecycle;
use primeline_domain::constants::{SCOPE_GMAIL_MODIFY, SCOPE_GMAIL_READONLY, SCOPE_GMAIL_SEND};
use primeline_domain::{CredentialError, CredentialRecord, MailError, MailMessage, SentMessage};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

type MailResult<T> = std::result::Result<T, MailError>;

/// Gmail client facade over the credential lifecycle manager.
pub struct GmailClient {
    lifecycle: Arc<CredentialLifecycle>,
    http: Client,
    base_url: String,
}

impl GmailClient {
    /// Create a client over the given lifecycle manager.
    ///
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be constructed.
    pub fn new(
        lifecycle: Arc<CredentialLifecycle>,
        timeout: Duration,
    ) -> primeline_domain::Result<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(|err| {
            CredentialError::Config(format!("failed to build HTTP client: {err}"))
        })?;

        Ok(Self { lifecycle, http, base_url: GMAIL_API_BASE.to_string() })
    }

    /// Override the API base URL (primarily for tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Email address of the authenticated account.
    ///
    /// # Errors
    /// `Unavailable` when no valid credential exists; `Api`/`Network` for
    /// provider failures.
    pub async fn profile(&self) -> MailResult<String> {
        let record = self.authorize(&[SCOPE_GMAIL_READONLY]).await?;

        let url = format!("{}/users/me/profile", self.base_url);
        let profile: ProfileResponse =
            self.execute(self.http.get(&url).bearer_auth(&record.token)).await?;
        Ok(profile.email_address)
    }

    /// Send a plain-text message.
    ///
    /// # Errors
    /// `Unavailable` when no valid credential exists or the `gmail.send`
    /// scope was not granted; `Api`/`Network` for provider failures.
    pub async fn send_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> MailResult<SentMessage> {
        let record = self.authorize(&[SCOPE_GMAIL_SEND]).await?;

        let rfc822 = format!(
            "To: {to}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{body}"
        );
        let raw = URL_SAFE.encode(rfc822.as_bytes());

        let url = format!("{}/users/me/messages/send", self.base_url);
        let sent: SendResponse = self
            .execute(
                self.http
                    .post(&url)
                    .bearer_auth(&record.token)
                    .json(&serde_json::json!({ "raw": raw })),
            )
            .await?;

        debug!(message_id = %sent.id, "message sent");
        let thread_id = sent.thread_id.unwrap_or_else(|| sent.id.clone());
        Ok(SentMessage { id: sent.id, thread_id })
    }

    /// Search the inbox and return full messages, most recent first.
    ///
    /// Messages that fail to fetch individually are skipped with a warning,
    /// mirroring how the mailbox pollers consume this.
    ///
    /// # Errors
    /// `Unavailable` when no valid credential exists; `Api`/`Network` when
    /// the listing itself fails.
    pub async fn search_messages(
        &self,
        query: Option<&str>,
        max_results: u32,
    ) -> MailResult<Vec<MailMessage>> {
        let record = self.authorize(&[SCOPE_GMAIL_READONLY]).await?;

        let url = format!("{}/users/me/messages", self.base_url);
        let mut request =
            self.http.get(&url).bearer_auth(&record.token).query(&[("maxResults", max_results)]);
        if let Some(query) = query {
            request = request.query(&[("q", query)]);
        }
        let listing: MessageList = self.execute(request).await?;

        let mut messages = Vec::with_capacity(listing.messages.len());
        for reference in listing.messages {
            match self.fetch_message(&record.token, &reference.id).await {
                Ok(message) => messages.push(message),
                Err(err) => {
                    warn!(message_id = %reference.id, error = %err, "skipping unreadable message");
                }
            }
        }
        Ok(messages)
    }

    /// All messages of a conversation thread.
    ///
    /// # Errors
    /// `Unavailable` when no valid credential exists; `Api`/`Network` for
    /// provider failures.
    pub async fn thread_messages(&self, thread_id: &str) -> MailResult<Vec<MailMessage>> {
        let record = self.authorize(&[SCOPE_GMAIL_READONLY]).await?;

        let url = format!("{}/users/me/threads/{thread_id}", self.base_url);
        let thread: ThreadResponse = self
            .execute(self.http.get(&url).bearer_auth(&record.token).query(&[("format", "full")]))
            .await?;

        Ok(thread.messages.into_iter().map(into_mail_message).collect())
    }

    /// Remove the `UNREAD` label from a message.
    ///
    /// # Errors
    /// `Unavailable` when no valid credential exists or the `gmail.modify`
    /// scope was not granted; `Api`/`Network` for provider failures.
    pub async fn mark_read(&self, message_id: &str) -> MailResult<()> {
        self.modify_labels(message_id, &["UNREAD"]).await
    }

    /// Remove a message from the inbox.
    ///
    /// # Errors
    /// Same as [`GmailClient::mark_read`].
    pub async fn archive(&self, message_id: &str) -> MailResult<()> {
        self.modify_labels(message_id, &["INBOX"]).await
    }

    /// Resolve a valid credential and verify the operation's scopes.
    async fn authorize(&self, required: &[&str]) -> MailResult<CredentialRecord> {
        let record = self.lifecycle.ensure_valid().await?;
        if let Some(missing) = record.first_missing_scope(required) {
            return Err(MailError::Unavailable(CredentialError::ScopeMismatch(
                missing.to_string(),
            )));
        }
        Ok(record)
    }

    async fn fetch_message(&self, token: &str, message_id: &str) -> MailResult<MailMessage> {
        let url = format!("{}/users/me/messages/{message_id}", self.base_url);
        let message: MessageResponse = self
            .execute(self.http.get(&url).bearer_auth(token).query(&[("format", "full")]))
            .await?;
        Ok(into_mail_message(message))
    }

    async fn modify_labels(&self, message_id: &str, remove: &[&str]) -> MailResult<()> {
        let record = self.authorize(&[SCOPE_GMAIL_MODIFY]).await?;

        let url = format!("{}/users/me/messages/{message_id}/modify", self.base_url);
        let _: MessageRef = self
            .execute(
                self.http
                    .post(&url)
                    .bearer_auth(&record.token)
                    .json(&serde_json::json!({ "removeLabelIds": remove })),
            )
            .await?;
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> MailResult<T> {
        let response = request.send().await.map_err(|err| MailError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MailError::Api { status: status.as_u16(), message });
        }

        response
            .json()
            .await
            .map_err(|err| MailError::Network(format!("failed to parse response: {err}")))
    }
}

fn into_mail_message(message: MessageResponse) -> MailMessage {
    let (subject, sender) = match &message.payload {
        Some(payload) => (
            header_value(payload, "subject").unwrap_or_else(|| "No Subject".to_string()),
            header_value(payload, "from").unwrap_or_else(|| "Unknown".to_string()),
        ),
        None => ("No Subject".to_string(), "Unknown".to_string()),
    };
    let body = message.payload.as_ref().map(extract_body).unwrap_or_default();

    MailMessage {
        id: message.id,
        thread_id: message.thread_id,
        subject,
        sender,
        body,
        date: message.internal_date,
        labels: message.label_ids,
    }
}

fn header_value(payload: &MessagePayload, name: &str) -> Option<String> {
    payload
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
}

/// Decode the text body from a (possibly nested) multipart payload,
/// preferring `text/plain` over `text/html`.
fn extract_body(payload: &MessagePayload) -> String {
    if payload.parts.is_empty() {
        return payload
            .body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .and_then(decode_body)
            .unwrap_or_default();
    }

    let mut html_fallback = String::new();
    for part in &payload.parts {
        if part.mime_type == "text/plain" {
            if let Some(text) = part.body.as_ref().and_then(|b| b.data.as_deref()).and_then(decode_body)
            {
                return text;
            }
        } else if part.mime_type == "text/html" && html_fallback.is_empty() {
            if let Some(html) =
                part.body.as_ref().and_then(|b| b.data.as_deref()).and_then(decode_body)
            {
                html_fallback = html;
            }
        } else if !part.parts.is_empty() {
            let nested = extract_body(part);
            if !nested.is_empty() {
                return nested;
            }
        }
    }
    html_fallback
}

fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(data).or_else(|_| URL_SAFE.decode(data)).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(rename = "emailAddress")]
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: String,
    #[serde(rename = "internalDate", default)]
    internal_date: String,
    #[serde(rename = "labelIds", default)]
    label_ids: Vec<String>,
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<MessageHeader>,
    body: Option<PayloadBody>,
    #[serde(default)]
    parts: Vec<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PayloadBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    #[serde(default)]
    messages: Vec<MessageResponse>,
}
