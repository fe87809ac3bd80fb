//! Domain constants for the Gmail credential subsystem

/// Scope required to send mail.
pub const SCOPE_GMAIL_SEND: &str = "https://www.googleapis.com/auth/gmail.send";

/// Scope required to read mail.
pub const SCOPE_GMAIL_READONLY: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Scope required to modify labels (mark read, archive).
pub const SCOPE_GMAIL_MODIFY: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Scopes the CRM's mail features require. A resolved credential whose
/// granted scope set does not cover one of these is rejected with
/// `ScopeMismatch` by the operation that needs the missing scope.
pub const REQUIRED_SCOPES: [&str; 3] = [SCOPE_GMAIL_SEND, SCOPE_GMAIL_READONLY, SCOPE_GMAIL_MODIFY];

/// Google OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Issuing authority domain used when a source omits it.
pub const DEFAULT_UNIVERSE_DOMAIN: &str = "googleapis.com";

/// Seconds before actual expiry at which a token is treated as needing
/// refresh, avoiding races with in-flight requests.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 60;

/// Default timeout for token refresh and Gmail API calls.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Namespace key of the credential table inside the injected secrets
/// mapping. Unrelated top-level keys in the mapping are ignored.
pub const SECRETS_NAMESPACE: &str = "gmail_token";

/// Alternative top-level secrets key holding the base64 of the whole JSON
/// credential record.
pub const SECRETS_B64_KEY: &str = "gmail_token_b64";
